//! Render backend trait for pluggable GPU implementations.
//!
//! `GpuResourceSync` drives a backend through this trait, so the buffer,
//! bind-group and bundle bookkeeping runs unchanged against WebGPU in the
//! browser and against a recording backend in native tests.

use crate::error::Result;
use crate::layout::VisibleCells;

/// One of the three instanced draws that make up a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRegion {
    /// The visible cell grid.
    Body,
    /// Column labels along the top edge.
    ColumnHeader,
    /// Row labels along the left edge.
    RowHeader,
}

impl DrawRegion {
    /// Submission order within a frame.
    pub const ALL: [Self; 3] = [Self::Body, Self::ColumnHeader, Self::RowHeader];

    pub fn label(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::ColumnHeader => "column header",
            Self::RowHeader => "row header",
        }
    }

    /// Vertex and fragment entry points in the cell shader.
    pub fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            Self::Body => ("vs_body", "fs_body"),
            Self::ColumnHeader => ("vs_column_header", "fs_column_header"),
            Self::RowHeader => ("vs_row_header", "fs_row_header"),
        }
    }

    pub fn instance_count(self, visible: VisibleCells) -> u32 {
        match self {
            Self::Body => visible.body_instances(),
            Self::ColumnHeader => visible.columns,
            Self::RowHeader => visible.rows,
        }
    }
}

/// GPU capability consumed by the grid.
///
/// Bind-group slots, in order: float uniforms, integer uniforms, cell data,
/// focused states, selected states.
pub trait GpuBackend {
    type Buffer;
    type BindGroup;
    type Pipeline;
    type Bundle;

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer>;

    fn create_storage_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer>;

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> Result<Self::Buffer>;

    /// Queue a write into an existing buffer. `data` fits the buffer.
    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn create_bind_group(&mut self, buffers: [&Self::Buffer; 5]) -> Self::BindGroup;

    fn create_pipeline(&mut self, region: DrawRegion) -> Result<Self::Pipeline>;

    /// Record a replayable draw of `instance_count` quads.
    fn create_render_bundle(
        &mut self,
        region: DrawRegion,
        pipeline: &Self::Pipeline,
        bind_group: &Self::BindGroup,
        vertices: &Self::Buffer,
        vertex_count: u32,
        instance_count: u32,
    ) -> Self::Bundle;

    /// Execute the bundles against the current color target in one
    /// submission. Does not wait for the GPU.
    fn submit(&mut self, bundles: &[Self::Bundle]) -> Result<()>;
}
