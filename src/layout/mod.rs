//! Viewport navigation geometry.
//!
//! This module handles:
//! - The visible rectangle, clamping, overscroll and momentum state
//! - Scroll-bar paging
//! - Classifying canvas points into body cells, headers and scroll-bar regions

mod viewport;

pub use hit_test::{classify_point, handle_edges, CellPosition, PointerContext};
pub use viewport::{Axis, TrackSide, Viewport, ViewportModel, VisibleCells};
