//! Property-based invariant tests for viewport navigation.
//!
//! These tests verify invariants that must hold for any valid inputs:
//!
//! 1. `regulate` output lies inside the grid with positive extent.
//! 2. `regulate` is idempotent on its own output.
//! 3. Inertia reaches exactly zero velocity and overscroll in bounded ticks.
//! 4. Repeating an identical focus update fires the callback at most once.
//! 5. Toggling the same cell selection twice restores the prior state.
//! 6. Wheel zoom never inverts or escapes the viewport.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{build, config, Shared};
use gpugrid::layout::{Viewport, ViewportModel};
use gpugrid::types::{shared_states, Extent, GridSize, Offset, Point, SourceId};
use gpugrid::viewer::{InertiaScheduler, SelectionFocusModel, SelectionHit};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn grid_strategy() -> impl Strategy<Value = GridSize> {
    (1u32..=2000, 1u32..=2000).prop_map(|(c, r)| GridSize::new(c, r))
}

fn proposal_strategy() -> impl Strategy<Value = Viewport> {
    (
        -5000.0f64..5000.0,
        -5000.0f64..5000.0,
        0.01f64..5000.0,
        0.01f64..5000.0,
    )
        .prop_map(|(left, top, w, h)| Viewport::new(left, top, left + w, top + h))
}

fn contained(v: Viewport, grid: GridSize) -> bool {
    v.left >= 0.0
        && v.top >= 0.0
        && v.right <= grid.columns_f64()
        && v.bottom <= grid.rows_f64()
        && v.right > v.left
        && v.bottom > v.top
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn regulate_output_is_contained(
        grid in grid_strategy(),
        proposed in proposal_strategy(),
        accumulate in any::<bool>(),
    ) {
        let mut model = ViewportModel::new(grid, None, None);
        let out = model.regulate(proposed.size(), Extent::new(1.0, 1.0), proposed, accumulate);
        prop_assert!(contained(out, grid), "escaped grid {:?}: {:?}", grid, out);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn regulate_is_idempotent(grid in grid_strategy(), proposed in proposal_strategy()) {
        let mut model = ViewportModel::new(grid, None, None);
        let once = model.regulate(proposed.size(), Extent::new(1.0, 1.0), proposed, false);
        let twice = model.regulate(once.size(), Extent::new(1.0, 1.0), once, false);
        prop_assert_eq!(once, twice);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Inertia convergence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn inertia_converges(
        vx in -1.0e4f64..1.0e4,
        vy in -1.0e4f64..1.0e4,
        ox in -1.0e4f64..1.0e4,
        oy in -1.0e4f64..1.0e4,
    ) {
        let mut model = ViewportModel::new(GridSize::new(100, 100), None, None);
        model.set_velocity(Offset::new(vx, vy));
        model.set_overscroll(Offset::new(ox, oy));
        let mut scheduler = InertiaScheduler::new();
        scheduler.start();

        let mut ticks = 0;
        while scheduler.tick(&mut model, false) {
            ticks += 1;
            prop_assert!(ticks < 2000, "no convergence after {} ticks", ticks);
        }
        prop_assert_eq!(model.velocity(), Offset::ZERO);
        prop_assert_eq!(model.overscroll(), Offset::ZERO);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Focus deduplication
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identical_focus_fires_once(column in proptest::option::of(0u32..20), row in proptest::option::of(0u32..20)) {
        let mut model = SelectionFocusModel::new(
            SourceId(0),
            GridSize::new(20, 20),
            shared_states(20),
            shared_states(20),
        )
        .unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        model.set_on_focus_change(Some(Box::new(move |_, _, _| counter.set(counter.get() + 1))));

        model.update_focus(column, row);
        model.update_focus(column, row);
        prop_assert!(fired.get() <= 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Toggle involution
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cell_toggle_is_involution(
        column in 0u32..16,
        row in 0u32..16,
        seed in proptest::collection::vec(any::<bool>(), 16),
    ) {
        let selected = shared_states(16);
        for (slot, on) in selected.borrow_mut().iter_mut().zip(&seed) {
            if *on {
                *slot = gpugrid::types::SelectState::Selected;
            }
        }
        let before = selected.borrow().clone();
        let mut model = SelectionFocusModel::new(
            SourceId(0),
            GridSize::new(16, 16),
            shared_states(16),
            Rc::clone(&selected),
        )
        .unwrap();

        let hit = SelectionHit::Cell { column, row };
        model.update_selection(hit);
        model.update_selection(hit);
        prop_assert_eq!(&*selected.borrow(), &before);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Wheel zoom
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wheel_zoom_stays_well_formed(
        x in 20.0f64..120.0,
        y in 20.0f64..120.0,
        deltas in proptest::collection::vec(prop_oneof![Just(-1.0f64), Just(1.0f64)], 1..200),
    ) {
        let shared = Shared::new(50);
        let mut grid = build(&config(50, 30, 120.0, 20.0), &shared);
        for delta in deltas {
            grid.wheel(Point::new(x, y), delta).unwrap();
            prop_assert!(contained(grid.viewport(), GridSize::new(50, 30)), "{:?}", grid.viewport());
        }
    }
}
