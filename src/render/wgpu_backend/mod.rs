//! wgpu (WebGPU) rendering backend.
//!
//! One shader module, one bind-group layout and three pipelines (body,
//! column header, row header) drawing instanced quads.

mod backend;
pub mod pipelines;

pub use backend::WgpuBackend;
