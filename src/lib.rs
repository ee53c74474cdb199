//! gpugrid - GPU grid viewer for the web
//!
//! Navigates grids of millions of numeric cells inside a fixed-size canvas
//! via WebAssembly and WebGPU:
//! - Viewport regulation with elastic overscroll and inertial momentum
//! - Drag, scroll-bar paging and wheel zoom about the pointer
//! - Column/row focus and selection shared between sibling grids
//! - Instanced drawing with cached render bundles
//!
//! The navigation core is plain Rust and generic over [`render::GpuBackend`],
//! so it runs and tests natively. The WebGPU backend and the exported
//! `GridView` are built for `wasm32` with the `wgpu-backend` feature.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView, IndexStates, ViewportStates } from 'gpugrid';
//! await init();
//! const states = new IndexStates(1000);
//! const viewports = new ViewportStates(2);
//! const view = await GridView.create(canvas, config, data, states, viewports);
//! view.setOnSelectionChange((source, column, row) => other.refreshSelection(source, column, row));
//! ```

pub mod error;
pub mod layout;
pub mod render;
pub mod types;
pub mod viewer;

pub use error::{GridError, Result};
pub use layout::{Viewport, ViewportModel};
pub use types::*;
pub use viewer::{Grid, InputEffect};

#[cfg(all(feature = "wgpu-backend", target_arch = "wasm32"))]
pub use viewer::{GridView, IndexStates, ViewportTable};
