//! GPU resource synchronization with pluggable backends.
//!
//! This module provides:
//! - The `GpuBackend` trait consumed by the grid
//! - Uniform layouts and the shared quad mesh
//! - `GpuResourceSync`, which owns the mirror buffers, the bind group and the render bundles
//! - wgpu/WebGPU backend (optional, via `wgpu-backend` feature)

pub mod backend;
pub mod buffers;
pub mod sync;

#[cfg(all(feature = "wgpu-backend", target_arch = "wasm32"))]
pub mod wgpu_backend;

pub use backend::{DrawRegion, GpuBackend};
pub use buffers::{F32Uniforms, U32Uniforms, QUAD_VERTEX_COUNT, QUAD_VERTICES};
pub use sync::GpuResourceSync;

#[cfg(all(feature = "wgpu-backend", target_arch = "wasm32"))]
pub use wgpu_backend::WgpuBackend;
