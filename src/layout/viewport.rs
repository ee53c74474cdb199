//! Viewport state: the visible rectangle, elastic overscroll and momentum.
//!
//! [`ViewportModel::regulate`] is the single clamping authority. Drags, wheel
//! zoom, scroll-bar paging and inertia all route their proposals through it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Extent, GridSize, Offset};

/// Visible rectangle in data (column/row) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The whole grid.
    pub fn full(grid: GridSize) -> Self {
        Self::new(0.0, 0.0, grid.columns_f64(), grid.rows_f64())
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Extent {
        Extent::new(self.width(), self.height())
    }

    /// Pixels per data unit when this rectangle fills `body`.
    pub fn cell_size(&self, body: Extent) -> Extent {
        Extent::new(body.width / self.width(), body.height / self.height())
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Finite, with positive width and height.
    pub fn is_well_formed(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.right > self.left
            && self.bottom > self.top
    }
}

/// Horizontal or vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Which side of a scroll-bar handle a track click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSide {
    Lower,
    Higher,
}

/// Integer number of columns and rows that intersect the viewport.
///
/// These are the instance counts of the three draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleCells {
    pub columns: u32,
    pub rows: u32,
}

impl VisibleCells {
    pub fn body_instances(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }
}

/// How a proposal related to the grid on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisFit {
    Within,
    Underflow,
    Overflow,
    Both,
}

#[derive(Debug, Clone, Copy)]
struct AxisResolution {
    low: f64,
    high: f64,
    fit: AxisFit,
    /// New overscroll for this axis, or `None` to leave it untouched.
    overscroll: Option<f64>,
}

fn resolve_axis(
    current: (f64, f64),
    proposed: (f64, f64),
    extent: f64,
    start_len: f64,
    cell_px: f64,
    accumulate_overscroll: bool,
) -> AxisResolution {
    let (low, high) = proposed;
    if !low.is_finite() || !high.is_finite() || high <= low {
        return AxisResolution {
            low: current.0,
            high: current.1,
            fit: AxisFit::Within,
            overscroll: None,
        };
    }
    let underflow = low < 0.0;
    let overflow = high > extent;
    let len = start_len.min(extent);
    match (underflow, overflow) {
        (true, true) => AxisResolution {
            low: 0.0,
            high: extent,
            fit: AxisFit::Both,
            overscroll: Some(0.0),
        },
        (true, false) => AxisResolution {
            low: 0.0,
            high: len,
            fit: AxisFit::Underflow,
            // Content is pulled away from the low edge: positive pixel offset.
            overscroll: accumulate_overscroll.then_some(-low * cell_px),
        },
        (false, true) => AxisResolution {
            low: extent - len,
            high: extent,
            fit: AxisFit::Overflow,
            overscroll: accumulate_overscroll.then_some(-(high - extent) * cell_px),
        },
        (false, false) => AxisResolution {
            low,
            high,
            fit: AxisFit::Within,
            overscroll: accumulate_overscroll.then_some(0.0),
        },
    }
}

/// Owns the viewport rectangle, overscroll and velocity of one grid.
#[derive(Debug, Clone)]
pub struct ViewportModel {
    grid: GridSize,
    viewport: Viewport,
    overscroll: Offset,
    velocity: Offset,
}

impl ViewportModel {
    /// Create a model, regulating the optional seed viewport into the grid.
    pub fn new(grid: GridSize, initial: Option<Viewport>, overscroll: Option<Offset>) -> Self {
        let full = Viewport::full(grid);
        let mut model = Self {
            grid,
            viewport: full,
            overscroll: overscroll.unwrap_or_default(),
            velocity: Offset::ZERO,
        };
        if let Some(seed) = initial {
            let size = seed.size();
            model.regulate(size, Extent::new(1.0, 1.0), seed, false);
        }
        model
    }

    pub fn grid_size(&self) -> GridSize {
        self.grid
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn overscroll(&self) -> Offset {
        self.overscroll
    }

    pub fn velocity(&self) -> Offset {
        self.velocity
    }

    pub fn set_overscroll(&mut self, overscroll: Offset) {
        self.overscroll = overscroll;
    }

    pub fn set_velocity(&mut self, velocity: Offset) {
        self.velocity = velocity;
    }

    /// Clamp `proposed` into the grid and apply it.
    ///
    /// Each axis is resolved independently:
    /// - under- and overflow at once: the axis snaps to the full grid extent
    /// - underflow only: low edge snaps to 0, the axis keeps `start_size`
    /// - overflow only: high edge snaps to the grid extent, the axis keeps `start_size`
    /// - within bounds: the proposal is taken verbatim
    ///
    /// Any clamp zeroes velocity on that axis. Overscroll is written from the
    /// clamped amount times `start_cell_size` only when `accumulate_overscroll`
    /// is set; otherwise it is left for the inertia tick to decay.
    pub fn regulate(
        &mut self,
        start_size: Extent,
        start_cell_size: Extent,
        proposed: Viewport,
        accumulate_overscroll: bool,
    ) -> Viewport {
        let horizontal = resolve_axis(
            (self.viewport.left, self.viewport.right),
            (proposed.left, proposed.right),
            self.grid.columns_f64(),
            start_size.width,
            start_cell_size.width,
            accumulate_overscroll,
        );
        let vertical = resolve_axis(
            (self.viewport.top, self.viewport.bottom),
            (proposed.top, proposed.bottom),
            self.grid.rows_f64(),
            start_size.height,
            start_cell_size.height,
            accumulate_overscroll,
        );

        self.viewport = Viewport::new(horizontal.low, vertical.low, horizontal.high, vertical.high);

        if horizontal.fit != AxisFit::Within {
            self.velocity.x = 0.0;
        }
        if vertical.fit != AxisFit::Within {
            self.velocity.y = 0.0;
        }
        if let Some(x) = horizontal.overscroll {
            self.overscroll.x = x;
        }
        if let Some(y) = vertical.overscroll {
            self.overscroll.y = y;
        }
        self.viewport
    }

    /// Move the viewport by one page toward `side` on `axis`.
    pub fn page(&mut self, axis: Axis, side: TrackSide) -> Viewport {
        let v = self.viewport;
        let proposed = match (axis, side) {
            (Axis::Horizontal, TrackSide::Lower) => {
                Viewport::new(v.left * 2.0 - v.right, v.top, v.left, v.bottom)
            }
            (Axis::Horizontal, TrackSide::Higher) => {
                Viewport::new(v.right, v.top, v.right * 2.0 - v.left, v.bottom)
            }
            (Axis::Vertical, TrackSide::Lower) => {
                Viewport::new(v.left, v.top * 2.0 - v.bottom, v.right, v.top)
            }
            (Axis::Vertical, TrackSide::Higher) => {
                Viewport::new(v.left, v.bottom, v.right, v.bottom * 2.0 - v.top)
            }
        };
        debug!(?axis, ?side, "page viewport");
        self.regulate(v.size(), Extent::new(1.0, 1.0), proposed, false)
    }

    /// Columns and rows intersecting the viewport, capped at the grid size.
    pub fn visible_cells(&self) -> VisibleCells {
        VisibleCells {
            columns: span(self.viewport.left, self.viewport.right, self.grid.num_columns),
            rows: span(self.viewport.top, self.viewport.bottom, self.grid.num_rows),
        }
    }
}

/// `min(ceil(high) - floor(low), cap)`, never negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn span(low: f64, high: f64, cap: u32) -> u32 {
    let count = (high.ceil() - low.floor()).max(0.0);
    if count >= f64::from(cap) {
        cap
    } else {
        count as u32
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn model(columns: u32, rows: u32) -> ViewportModel {
        ViewportModel::new(GridSize::new(columns, rows), None, None)
    }

    #[test]
    fn defaults_to_full_grid() {
        let m = model(7, 3);
        assert_eq!(m.viewport(), Viewport::new(0.0, 0.0, 7.0, 3.0));
    }

    #[test]
    fn seed_viewport_is_clamped() {
        let m = ViewportModel::new(
            GridSize::new(10, 10),
            Some(Viewport::new(8.0, 0.0, 12.0, 4.0)),
            None,
        );
        assert_eq!(m.viewport(), Viewport::new(6.0, 0.0, 10.0, 4.0));
    }

    #[test]
    fn within_bounds_is_taken_verbatim() {
        let mut m = model(100, 100);
        let proposed = Viewport::new(10.5, 20.25, 30.5, 40.25);
        let applied = m.regulate(proposed.size(), Extent::new(5.0, 5.0), proposed, true);
        assert_eq!(applied, proposed);
        assert_eq!(m.overscroll(), Offset::ZERO);
    }

    #[test]
    fn underflow_snaps_low_edge_and_records_overscroll() {
        let mut m = model(100, 100);
        m.set_velocity(Offset::new(-2.0, 1.0));
        let proposed = Viewport::new(-3.0, 10.0, 7.0, 20.0);
        let applied = m.regulate(Extent::new(10.0, 10.0), Extent::new(4.0, 4.0), proposed, true);
        assert_eq!(applied, Viewport::new(0.0, 10.0, 10.0, 20.0));
        assert_eq!(m.overscroll().x, 12.0);
        assert_eq!(m.overscroll().y, 0.0);
        assert_eq!(m.velocity(), Offset::new(0.0, 1.0));
    }

    #[test]
    fn overflow_snaps_high_edge_with_negative_overscroll() {
        let mut m = model(50, 50);
        let proposed = Viewport::new(10.0, 45.0, 20.0, 52.0);
        let applied = m.regulate(Extent::new(10.0, 7.0), Extent::new(2.0, 3.0), proposed, true);
        assert_eq!(applied, Viewport::new(10.0, 43.0, 20.0, 50.0));
        assert_eq!(m.overscroll().y, -6.0);
    }

    #[test]
    fn both_edges_snap_to_full_extent() {
        let mut m = model(5, 5);
        m.set_overscroll(Offset::new(9.0, 9.0));
        let proposed = Viewport::new(-1.0, 1.0, 6.0, 2.0);
        let applied = m.regulate(proposed.size(), Extent::new(1.0, 1.0), proposed, false);
        assert_eq!(applied.left, 0.0);
        assert_eq!(applied.right, 5.0);
        assert_eq!(m.overscroll().x, 0.0);
        // Untouched axis keeps its overscroll when accumulation is off.
        assert_eq!(m.overscroll().y, 9.0);
    }

    #[test]
    fn disabled_accumulation_leaves_overscroll() {
        let mut m = model(10, 10);
        m.set_overscroll(Offset::new(3.0, 0.0));
        m.regulate(
            Extent::new(5.0, 5.0),
            Extent::new(1.0, 1.0),
            Viewport::new(-2.0, 0.0, 3.0, 5.0),
            false,
        );
        assert_eq!(m.overscroll().x, 3.0);
    }

    #[test]
    fn start_size_larger_than_grid_stays_contained() {
        let mut m = model(4, 4);
        let applied = m.regulate(
            Extent::new(6.0, 6.0),
            Extent::new(1.0, 1.0),
            Viewport::new(-1.0, 0.0, 3.0, 4.0),
            true,
        );
        assert_eq!(applied.right, 4.0);
    }

    #[test]
    fn non_finite_proposal_keeps_current_axis() {
        let mut m = model(10, 10);
        let before = m.viewport();
        let applied = m.regulate(
            Extent::new(10.0, 10.0),
            Extent::new(1.0, 1.0),
            Viewport::new(f64::NAN, 0.0, 5.0, 10.0),
            true,
        );
        assert_eq!(applied.left, before.left);
        assert_eq!(applied.right, before.right);
    }

    #[test]
    fn page_higher_then_lower_returns() {
        let mut m = ViewportModel::new(
            GridSize::new(100, 100),
            Some(Viewport::new(10.0, 0.0, 20.0, 10.0)),
            None,
        );
        assert_eq!(
            m.page(Axis::Horizontal, TrackSide::Higher),
            Viewport::new(20.0, 0.0, 30.0, 10.0)
        );
        assert_eq!(
            m.page(Axis::Horizontal, TrackSide::Lower),
            Viewport::new(10.0, 0.0, 20.0, 10.0)
        );
    }

    #[test]
    fn page_clamps_at_edges() {
        let mut m = ViewportModel::new(
            GridSize::new(25, 25),
            Some(Viewport::new(0.0, 3.0, 10.0, 13.0)),
            None,
        );
        assert_eq!(
            m.page(Axis::Vertical, TrackSide::Lower),
            Viewport::new(0.0, 0.0, 10.0, 10.0)
        );
        m.page(Axis::Vertical, TrackSide::Higher);
        assert_eq!(
            m.page(Axis::Vertical, TrackSide::Higher),
            Viewport::new(0.0, 15.0, 10.0, 25.0)
        );
    }

    #[test]
    fn visible_cells_count_partial_cells() {
        let m = ViewportModel::new(
            GridSize::new(100, 100),
            Some(Viewport::new(1.5, 2.0, 4.5, 5.0)),
            None,
        );
        assert_eq!(m.visible_cells(), VisibleCells { columns: 4, rows: 3 });
    }

    #[test]
    fn visible_cells_capped_at_grid() {
        let m = model(3, 2);
        assert_eq!(m.visible_cells(), VisibleCells { columns: 3, rows: 2 });
        assert_eq!(m.visible_cells().body_instances(), 6);
    }
}
