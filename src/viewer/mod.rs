//! Grid instances and their browser host.
//!
//! This module provides:
//! - `Grid`, one navigable grid generic over its GPU backend
//! - Input interpretation (drag, scroll-bar paging, wheel zoom, hover)
//! - Shared focus/selection marks with change callbacks
//! - The inertia scheduler driving momentum and elastic overscroll
//! - `GridView`, the WASM-exported host (wasm32 + `wgpu-backend` only)

mod grid;
mod inertia;
mod input;
mod selection;

#[cfg(all(feature = "wgpu-backend", target_arch = "wasm32"))]
mod view;

pub use grid::{viewport_states, Grid, InputEffect, ViewportStates};
pub use inertia::{
    InertiaScheduler, SchedulerState, EDGE_FRICTION, OVERSCROLL_EPSILON, TICK_INTERVAL_MS,
    TRANSLATE_FRICTION, VELOCITY_EPSILON,
};
pub use input::{Cursor, DragState, InputInterpreter, PointerDown, ZOOM_IN_SCALE, ZOOM_OUT_SCALE};
pub use selection::{ChangeCallback, SelectionFocusModel, SelectionHit};

#[cfg(all(feature = "wgpu-backend", target_arch = "wasm32"))]
pub use view::{GridView, IndexStates, ViewportTable};
