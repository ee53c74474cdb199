//! Momentum and elastic-edge decay.

use crate::layout::ViewportModel;
use crate::types::Offset;

/// Period of the inertia tick in milliseconds.
pub const TICK_INTERVAL_MS: i32 = 16;
/// Overscroll multiplier per tick.
pub const EDGE_FRICTION: f64 = 0.8;
/// Velocity multiplier per tick.
pub const TRANSLATE_FRICTION: f64 = 0.975;
/// Overscroll snaps to zero once no component exceeds this (pixels).
pub const OVERSCROLL_EPSILON: f64 = 0.1;
/// Velocity snaps to zero once no component exceeds this (cells per tick).
pub const VELOCITY_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Ticking,
}

/// Idle/ticking state machine for the periodic inertia tick.
///
/// The host owns the actual timer: it arms one when [`start`](Self::start)
/// returns `true` and clears it when [`tick`](Self::tick) returns `false`.
#[derive(Debug, Default)]
pub struct InertiaScheduler {
    state: SchedulerState,
}

impl InertiaScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_ticking(&self) -> bool {
        self.state == SchedulerState::Ticking
    }

    /// Request ticking. Returns `true` only on the idle to ticking transition.
    pub fn start(&mut self) -> bool {
        match self.state {
            SchedulerState::Ticking => false,
            SchedulerState::Idle => {
                self.state = SchedulerState::Ticking;
                true
            }
        }
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Idle;
    }

    /// Advance one tick. Returns whether ticking continues.
    ///
    /// While a drag is active nothing decays and ticking continues.
    pub fn tick(&mut self, model: &mut ViewportModel, dragging: bool) -> bool {
        if self.state == SchedulerState::Idle {
            return false;
        }
        if dragging {
            return true;
        }
        let overscroll = decay(model.overscroll(), EDGE_FRICTION, OVERSCROLL_EPSILON);
        let velocity = decay(model.velocity(), TRANSLATE_FRICTION, VELOCITY_EPSILON);
        model.set_overscroll(overscroll);
        model.set_velocity(velocity);
        if overscroll.is_zero() && velocity.is_zero() {
            self.state = SchedulerState::Idle;
            return false;
        }
        true
    }
}

fn decay(value: Offset, friction: f64, epsilon: f64) -> Offset {
    if value.exceeds(epsilon) {
        Offset::new(value.x * friction, value.y * friction)
    } else {
        Offset::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::GridSize;

    fn moving_model() -> ViewportModel {
        let mut m = ViewportModel::new(GridSize::new(100, 100), None, None);
        m.set_velocity(Offset::new(1.0, -0.5));
        m.set_overscroll(Offset::new(20.0, 0.0));
        m
    }

    #[test]
    fn start_is_idempotent() {
        let mut s = InertiaScheduler::new();
        assert!(s.start());
        assert!(!s.start());
        assert!(s.is_ticking());
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut s = InertiaScheduler::new();
        let mut m = moving_model();
        assert!(!s.tick(&mut m, false));
        assert_eq!(m.velocity(), Offset::new(1.0, -0.5));
    }

    #[test]
    fn one_tick_applies_friction() {
        let mut s = InertiaScheduler::new();
        let mut m = moving_model();
        s.start();
        assert!(s.tick(&mut m, false));
        assert_eq!(m.overscroll(), Offset::new(16.0, 0.0));
        assert_eq!(m.velocity(), Offset::new(0.975, -0.4875));
    }

    #[test]
    fn dragging_suspends_decay() {
        let mut s = InertiaScheduler::new();
        let mut m = moving_model();
        s.start();
        assert!(s.tick(&mut m, true));
        assert_eq!(m.overscroll(), Offset::new(20.0, 0.0));
    }

    #[test]
    fn converges_and_returns_to_idle() {
        let mut s = InertiaScheduler::new();
        let mut m = moving_model();
        s.start();
        let mut ticks = 0;
        while s.tick(&mut m, false) {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(m.velocity().is_zero());
        assert!(m.overscroll().is_zero());
        assert!(s.start());
    }
}
