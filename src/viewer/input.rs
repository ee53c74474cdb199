//! Pointer, touch and wheel interpretation.
//!
//! Turns canvas-local input into drags, scroll-bar paging, zoom proposals and
//! hover state. All viewport changes go through [`ViewportModel::regulate`].

use tracing::debug;

use crate::error::{GridError, Result};
use crate::layout::{
    classify_point, Axis, CellPosition, PointerContext, TrackSide, Viewport, ViewportModel,
};
use crate::types::{Extent, GeometryState, Offset, Point, ScrollbarFocus};

use super::selection::SelectionHit;

/// Wheel scale when scrolling down (zoom out).
pub const ZOOM_OUT_SCALE: f64 = 1.03;
/// Wheel scale when scrolling up (zoom in).
pub const ZOOM_IN_SCALE: f64 = 0.98;

/// CSS cursor affordance for the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Cell,
    Grab,
    Grabbing,
    Pointer,
    WResize,
    EResize,
    NResize,
    SResize,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cell => "cell",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::Pointer => "pointer",
            Self::WResize => "w-resize",
            Self::EResize => "e-resize",
            Self::NResize => "n-resize",
            Self::SResize => "s-resize",
        }
    }
}

/// Snapshot taken when a pointer goes down on a draggable region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start: Point,
    pub previous: Point,
    pub start_viewport: Viewport,
    pub start_size: Extent,
    pub start_cell_size: Extent,
    /// Current pointer position minus `start`.
    pub delta: Offset,
}

/// What a pointer-down did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerDown {
    /// A drag began. `selection` is set when a header was hit.
    Drag { selection: Option<SelectionHit> },
    /// A scroll-bar track was clicked and the viewport paged.
    Paged(Viewport),
    /// Nothing actionable under the pointer.
    Ignored,
}

#[derive(Debug, Default)]
pub struct InputInterpreter {
    drag: Option<DragState>,
    scrollbar_focus: ScrollbarFocus,
    cursor: Cursor,
}

impl InputInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn scrollbar_focus(&self) -> ScrollbarFocus {
        self.scrollbar_focus
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Overscroll accumulates unless a single scroll bar owns the pointer.
    pub fn accumulates_overscroll(&self) -> bool {
        !self.scrollbar_focus.is_single_axis()
    }

    pub fn pointer_down(
        &mut self,
        geometry: &GeometryState,
        model: &mut ViewportModel,
        point: Point,
    ) -> PointerDown {
        let position = classify_point(geometry, &model.viewport(), model.overscroll(), point);

        let on_header = position.column.is_header() || position.row.is_header();
        let on_body = position.column.index().is_some() && position.row.index().is_some();

        if on_header || on_body || position.is_handle() {
            let viewport = model.viewport();
            self.drag = Some(DragState {
                start: point,
                previous: point,
                start_viewport: viewport,
                start_size: viewport.size(),
                start_cell_size: viewport.cell_size(geometry.body_extent()),
                delta: Offset::ZERO,
            });
            self.cursor = Cursor::Grab;
            debug!(x = point.x, y = point.y, "drag started");
            let selection = if on_header {
                SelectionHit::from_position(position)
            } else {
                None
            };
            return PointerDown::Drag { selection };
        }

        match track_hit(position) {
            Some((axis, side)) => PointerDown::Paged(model.page(axis, side)),
            None => PointerDown::Ignored,
        }
    }

    /// Advance the active drag to `point`.
    ///
    /// Also sets the release velocity from the movement since the previous
    /// point, scaled from pixels to cells.
    ///
    /// # Errors
    /// Returns [`GridError::DragInactive`] when no drag is active.
    pub fn drag_move(
        &mut self,
        geometry: &GeometryState,
        model: &mut ViewportModel,
        point: Point,
    ) -> Result<()> {
        let drag = self.drag.as_mut().ok_or(GridError::DragInactive)?;
        let movement = point - drag.previous;
        let delta = point - drag.start;
        drag.delta = Offset::new(delta.x, delta.y);
        drag.previous = point;
        model.set_velocity(Offset::new(
            -movement.x * drag.start_size.width / geometry.canvas_size.width,
            -movement.y * drag.start_size.height / geometry.canvas_size.height,
        ));
        self.cursor = Cursor::Grabbing;
        Ok(())
    }

    /// Proposed viewport for the current drag delta.
    ///
    /// With a single scroll bar focused the delta moves the handle: the
    /// whole grid maps onto the body, with inverted sign, on that axis only.
    /// Otherwise the delta pans the start viewport.
    ///
    /// # Errors
    /// Returns [`GridError::DragInactive`] when no drag is active.
    pub fn drag_proposal(&self, geometry: &GeometryState) -> Result<Viewport> {
        let drag = self.drag.as_ref().ok_or(GridError::DragInactive)?;
        let body = geometry.body_extent();
        let grid = geometry.grid_extent();
        let (dx, dy) = match self.scrollbar_focus {
            ScrollbarFocus::Horizontal => (-grid.width * drag.delta.x / body.width, 0.0),
            ScrollbarFocus::Vertical => (0.0, -grid.height * drag.delta.y / body.height),
            ScrollbarFocus::None | ScrollbarFocus::Both => (
                drag.start_viewport.width() * drag.delta.x / body.width,
                drag.start_viewport.height() * drag.delta.y / body.height,
            ),
        };
        Ok(drag.start_viewport.translated(-dx, -dy))
    }

    /// Idle pointer movement: update scroll-bar focus and cursor, and
    /// return the classified position for focus marking.
    pub fn hover(
        &mut self,
        geometry: &GeometryState,
        model: &ViewportModel,
        point: Point,
    ) -> CellPosition {
        let position = classify_point(geometry, &model.viewport(), model.overscroll(), point);
        let (focus, cursor) = hover_affordance(position);
        self.scrollbar_focus = focus;
        self.cursor = cursor;
        position
    }

    pub fn pointer_up(&mut self) {
        if self.drag.take().is_some() {
            debug!("drag ended");
        }
        self.cursor = Cursor::Default;
    }

    /// Leaving the canvas keeps any active drag.
    pub fn pointer_leave(&mut self) {
        self.cursor = Cursor::Default;
    }

    /// Zoom about the pointer. Returns `None` for a zero vertical delta.
    pub fn wheel(
        &self,
        geometry: &GeometryState,
        model: &mut ViewportModel,
        point: Point,
        delta_y: f64,
    ) -> Option<Viewport> {
        if delta_y == 0.0 {
            return None;
        }
        let scale = if delta_y > 0.0 {
            ZOOM_OUT_SCALE
        } else {
            ZOOM_IN_SCALE
        };
        let viewport = model.viewport();
        let body = geometry.body_extent();
        let grid = geometry.grid_extent();

        let cx = viewport.width() * (point.x - geometry.header_offset.left) / body.width
            + viewport.left;
        let cy = viewport.height() * (point.y - geometry.header_offset.top) / body.height
            + viewport.top;

        let (left, right) = clip_zoomed_axis(
            cx + (viewport.left - cx) * scale,
            cx + (viewport.right - cx) * scale,
            viewport.right,
            grid.width,
        );
        let (top, bottom) = clip_zoomed_axis(
            cy + (viewport.top - cy) * scale,
            cy + (viewport.bottom - cy) * scale,
            viewport.bottom,
            grid.height,
        );

        let proposed = Viewport::new(left, top, right, bottom);
        Some(model.regulate(
            proposed.size(),
            proposed.cell_size(body),
            proposed,
            self.accumulates_overscroll(),
        ))
    }
}

/// Keep a zoomed axis inside `[0, extent]` by sliding it, or fall back to
/// `[0, old_high]` when it overhangs both ends.
fn clip_zoomed_axis(low: f64, high: f64, old_high: f64, extent: f64) -> (f64, f64) {
    match (low < 0.0, high > extent) {
        (true, true) => (0.0, old_high),
        (true, false) => (0.0, high - low),
        (false, true) => (low - (high - extent), extent),
        (false, false) => (low, high),
    }
}

fn track_hit(position: CellPosition) -> Option<(Axis, TrackSide)> {
    match (position.column, position.row) {
        (PointerContext::ScrollbarLower, _) => Some((Axis::Horizontal, TrackSide::Lower)),
        (_, PointerContext::ScrollbarLower) => Some((Axis::Vertical, TrackSide::Lower)),
        (PointerContext::ScrollbarHigher, _) => Some((Axis::Horizontal, TrackSide::Higher)),
        (_, PointerContext::ScrollbarHigher) => Some((Axis::Vertical, TrackSide::Higher)),
        _ => None,
    }
}

fn hover_affordance(position: CellPosition) -> (ScrollbarFocus, Cursor) {
    use PointerContext::{
        ScrollbarCombined, ScrollbarHandle, ScrollbarHigher, ScrollbarLower,
    };
    match (position.column, position.row) {
        (ScrollbarCombined, _) | (_, ScrollbarCombined) => (ScrollbarFocus::Both, Cursor::Default),
        (ScrollbarHandle, _) => (ScrollbarFocus::Horizontal, Cursor::Pointer),
        (_, ScrollbarHandle) => (ScrollbarFocus::Vertical, Cursor::Pointer),
        (ScrollbarLower, _) => (ScrollbarFocus::Horizontal, Cursor::WResize),
        (ScrollbarHigher, _) => (ScrollbarFocus::Horizontal, Cursor::EResize),
        (_, ScrollbarLower) => (ScrollbarFocus::Vertical, Cursor::NResize),
        (_, ScrollbarHigher) => (ScrollbarFocus::Vertical, Cursor::SResize),
        _ => (ScrollbarFocus::None, Cursor::Cell),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{CanvasSize, GridSize, HeaderOffset};

    // 100x100 body pixels after a 20px header.
    fn geometry(columns: u32, rows: u32) -> GeometryState {
        GeometryState::new(
            GridSize::new(columns, rows),
            CanvasSize {
                width: 120.0,
                height: 120.0,
            },
            HeaderOffset {
                left: 20.0,
                top: 20.0,
            },
            None,
        )
    }

    #[test]
    fn drag_move_without_drag_is_an_error() {
        let g = geometry(10, 10);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let mut input = InputInterpreter::new();
        assert!(matches!(
            input.drag_move(&g, &mut model, Point::new(1.0, 1.0)),
            Err(GridError::DragInactive)
        ));
        assert!(matches!(input.drag_proposal(&g), Err(GridError::DragInactive)));
    }

    #[test]
    fn body_drag_pans_with_viewport_scale() {
        let g = geometry(100, 100);
        let mut model =
            ViewportModel::new(g.grid_size, Some(Viewport::new(10.0, 10.0, 20.0, 20.0)), None);
        let mut input = InputInterpreter::new();
        let down = input.pointer_down(&g, &mut model, Point::new(50.0, 50.0));
        assert_eq!(down, PointerDown::Drag { selection: None });
        input.drag_move(&g, &mut model, Point::new(70.0, 40.0)).unwrap();
        // 20px of a 100px body showing 10 cells is 2 cells.
        assert_eq!(
            input.drag_proposal(&g).unwrap(),
            Viewport::new(8.0, 11.0, 18.0, 21.0)
        );
        assert_eq!(model.velocity(), Offset::new(-20.0 * 10.0 / 120.0, 10.0 * 10.0 / 120.0));
    }

    #[test]
    fn header_down_reports_selection() {
        let g = geometry(10, 10);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let mut input = InputInterpreter::new();
        let down = input.pointer_down(&g, &mut model, Point::new(45.0, 5.0));
        assert_eq!(
            down,
            PointerDown::Drag {
                selection: Some(SelectionHit::Column(2))
            }
        );
        assert!(input.is_dragging());
    }

    #[test]
    fn track_click_pages() {
        let g = geometry(100, 100);
        let mut model =
            ViewportModel::new(g.grid_size, Some(Viewport::new(0.0, 10.0, 10.0, 20.0)), None);
        let mut input = InputInterpreter::new();
        // Vertical strip, below the handle.
        let down = input.pointer_down(&g, &mut model, Point::new(110.0, 95.0));
        assert_eq!(down, PointerDown::Paged(Viewport::new(0.0, 20.0, 10.0, 30.0)));
        assert!(!input.is_dragging());
    }

    #[test]
    fn handle_hover_focuses_scroll_bar() {
        let g = geometry(10, 10);
        let model = ViewportModel::new(g.grid_size, Some(Viewport::new(0.0, 4.0, 10.0, 6.0)), None);
        let mut input = InputInterpreter::new();
        input.hover(&g, &model, Point::new(110.0, 60.0));
        assert_eq!(input.scrollbar_focus(), ScrollbarFocus::Vertical);
        assert_eq!(input.cursor(), Cursor::Pointer);
        assert!(!input.accumulates_overscroll());
        input.hover(&g, &model, Point::new(50.0, 50.0));
        assert_eq!(input.scrollbar_focus(), ScrollbarFocus::None);
        assert_eq!(input.cursor(), Cursor::Cell);
    }

    #[test]
    fn handle_drag_moves_by_grid_scale() {
        let g = geometry(100, 100);
        let mut model =
            ViewportModel::new(g.grid_size, Some(Viewport::new(0.0, 0.0, 10.0, 10.0)), None);
        let mut input = InputInterpreter::new();
        // Horizontal handle spans roughly 12..44 px.
        input.hover(&g, &model, Point::new(30.0, 110.0));
        assert_eq!(input.scrollbar_focus(), ScrollbarFocus::Horizontal);
        input.pointer_down(&g, &mut model, Point::new(30.0, 110.0));
        input.drag_move(&g, &mut model, Point::new(40.0, 90.0)).unwrap();
        // 10px of 100px body over a 100-column grid is 10 columns.
        assert_eq!(
            input.drag_proposal(&g).unwrap(),
            Viewport::new(10.0, 0.0, 20.0, 10.0)
        );
    }

    #[test]
    fn zero_wheel_is_ignored() {
        let g = geometry(5, 5);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let input = InputInterpreter::new();
        assert_eq!(input.wheel(&g, &mut model, Point::new(70.0, 70.0), 0.0), None);
    }

    #[test]
    fn wheel_zoom_in_is_symmetric_about_center() {
        let g = geometry(5, 5);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let input = InputInterpreter::new();
        let v = input
            .wheel(&g, &mut model, Point::new(70.0, 70.0), -1.0)
            .unwrap();
        assert!((v.left - 0.05).abs() < 1e-9);
        assert!((v.right - 4.95).abs() < 1e-9);
        assert!((v.left - (5.0 - v.right)).abs() < 1e-9);
        assert!(v.right > v.left && v.bottom > v.top);
    }

    #[test]
    fn wheel_zoom_out_at_full_extent_stays_full() {
        let g = geometry(5, 5);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let input = InputInterpreter::new();
        let v = input
            .wheel(&g, &mut model, Point::new(30.0, 90.0), 1.0)
            .unwrap();
        assert_eq!(v, Viewport::new(0.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn pointer_up_clears_drag_but_leave_keeps_it() {
        let g = geometry(10, 10);
        let mut model = ViewportModel::new(g.grid_size, None, None);
        let mut input = InputInterpreter::new();
        input.pointer_down(&g, &mut model, Point::new(50.0, 50.0));
        input.pointer_leave();
        assert!(input.is_dragging());
        input.pointer_up();
        assert!(!input.is_dragging());
        assert_eq!(input.cursor(), Cursor::Default);
    }

    #[test]
    fn clip_slides_or_falls_back() {
        assert_eq!(clip_zoomed_axis(-1.0, 4.0, 5.0, 10.0), (0.0, 5.0));
        assert_eq!(clip_zoomed_axis(7.0, 11.0, 10.0, 10.0), (6.0, 10.0));
        assert_eq!(clip_zoomed_axis(-1.0, 11.0, 9.0, 10.0), (0.0, 9.0));
    }
}
