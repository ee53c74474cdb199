//! Backend buffers mirroring grid state.
//!
//! Uniform writes go straight into their buffers. Storage uploads are written
//! in place when they fit, otherwise the buffer is replaced and the
//! generation counter bumps. The bind group is rebuilt lazily when its
//! generation is stale, and the three render bundles are re-recorded only
//! when the generation or the visible cell counts change.

use tracing::{debug, trace};

use super::backend::{DrawRegion, GpuBackend};
use super::buffers::{
    word_buffer_size, F32Uniforms, U32Uniforms, QUAD_VERTEX_COUNT, QUAD_VERTICES,
};
use crate::error::{GridError, Result};
use crate::layout::VisibleCells;
use crate::types::{FocusState, GridSize, SelectState};

struct StorageBuffer<T> {
    buffer: T,
    capacity: u64,
}

/// One pipeline per draw region.
struct RegionPipelines<P> {
    body: P,
    column_header: P,
    row_header: P,
}

impl<P> RegionPipelines<P> {
    fn get(&self, region: DrawRegion) -> &P {
        match region {
            DrawRegion::Body => &self.body,
            DrawRegion::ColumnHeader => &self.column_header,
            DrawRegion::RowHeader => &self.row_header,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BundleKey {
    generation: u64,
    visible: VisibleCells,
}

pub struct GpuResourceSync<B: GpuBackend> {
    backend: B,
    f32_uniforms: B::Buffer,
    u32_uniforms: B::Buffer,
    data: StorageBuffer<B::Buffer>,
    focused: StorageBuffer<B::Buffer>,
    selected: StorageBuffer<B::Buffer>,
    vertices: B::Buffer,
    pipelines: RegionPipelines<B::Pipeline>,
    generation: u64,
    bind_group: Option<(u64, B::BindGroup)>,
    bundles: Option<(BundleKey, [B::Bundle; 3])>,
}

impl<B: GpuBackend> GpuResourceSync<B> {
    /// Allocate every buffer and pipeline for a grid of `grid` size.
    ///
    /// # Errors
    /// [`GridError::InvalidConfig`] when the cell count overflows, otherwise
    /// propagates backend allocation and pipeline failures.
    pub fn new(mut backend: B, grid: GridSize) -> Result<Self> {
        let f32_uniforms = backend
            .create_uniform_buffer("F32Uniforms", std::mem::size_of::<F32Uniforms>() as u64)?;
        let u32_uniforms = backend
            .create_uniform_buffer("U32Uniforms", std::mem::size_of::<U32Uniforms>() as u64)?;

        let cells = grid
            .cell_count()
            .ok_or_else(|| GridError::InvalidConfig("cell count overflows".into()))?;
        let data_size = word_buffer_size(cells);
        let index_size = word_buffer_size(grid.index_space());
        let data = StorageBuffer {
            buffer: backend.create_storage_buffer("GridData", data_size)?,
            capacity: data_size,
        };
        let focused = StorageBuffer {
            buffer: backend.create_storage_buffer("FocusedIndices", index_size)?,
            capacity: index_size,
        };
        let selected = StorageBuffer {
            buffer: backend.create_storage_buffer("SelectedIndices", index_size)?,
            capacity: index_size,
        };
        let vertices =
            backend.create_vertex_buffer("Vertices", bytemuck::cast_slice(&QUAD_VERTICES))?;
        let pipelines = RegionPipelines {
            body: backend.create_pipeline(DrawRegion::Body)?,
            column_header: backend.create_pipeline(DrawRegion::ColumnHeader)?,
            row_header: backend.create_pipeline(DrawRegion::RowHeader)?,
        };

        Ok(Self {
            backend,
            f32_uniforms,
            u32_uniforms,
            data,
            focused,
            selected,
            vertices,
            pipelines,
            generation: 0,
            bind_group: None,
            bundles: None,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Bumps whenever any bound buffer is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn update_f32_uniforms(&mut self, uniforms: &F32Uniforms) {
        self.backend
            .write_buffer(&self.f32_uniforms, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn update_u32_uniforms(&mut self, uniforms: &U32Uniforms) {
        self.backend
            .write_buffer(&self.u32_uniforms, 0, bytemuck::bytes_of(uniforms));
    }

    /// # Errors
    /// Propagates backend allocation failures when the buffer must grow.
    pub fn update_data(&mut self, data: &[f32]) -> Result<()> {
        upload_storage(
            &mut self.backend,
            &mut self.data,
            &mut self.generation,
            "GridData",
            bytemuck::cast_slice(data),
        )
    }

    /// # Errors
    /// Propagates backend allocation failures when the buffer must grow.
    pub fn update_focused(&mut self, states: &[FocusState]) -> Result<()> {
        upload_storage(
            &mut self.backend,
            &mut self.focused,
            &mut self.generation,
            "FocusedIndices",
            bytemuck::cast_slice(states),
        )
    }

    /// # Errors
    /// Propagates backend allocation failures when the buffer must grow.
    pub fn update_selected(&mut self, states: &[SelectState]) -> Result<()> {
        upload_storage(
            &mut self.backend,
            &mut self.selected,
            &mut self.generation,
            "SelectedIndices",
            bytemuck::cast_slice(states),
        )
    }

    /// The bind group for the current generation, rebuilding it if stale.
    pub fn bind_group(&mut self) -> &B::BindGroup {
        let generation = self.generation;
        let group = match self.bind_group.take() {
            Some((g, group)) if g == generation => group,
            _ => {
                debug!(generation, "rebuilding bind group");
                self.backend.create_bind_group([
                    &self.f32_uniforms,
                    &self.u32_uniforms,
                    &self.data.buffer,
                    &self.focused.buffer,
                    &self.selected.buffer,
                ])
            }
        };
        &self.bind_group.insert((generation, group)).1
    }

    /// Draw body, column headers and row headers in one submission.
    ///
    /// # Errors
    /// Propagates backend submission failures.
    pub fn render(&mut self, visible: VisibleCells) -> Result<()> {
        self.bind_group();
        let key = BundleKey {
            generation: self.generation,
            visible,
        };
        let fresh = matches!(&self.bundles, Some((k, _)) if *k == key);
        if !fresh {
            if let Some((_, bind_group)) = self.bind_group.as_ref() {
                debug!(
                    generation = key.generation,
                    columns = visible.columns,
                    rows = visible.rows,
                    "recording render bundles"
                );
                let backend = &mut self.backend;
                let pipelines = &self.pipelines;
                let vertices = &self.vertices;
                let bundles = DrawRegion::ALL.map(|region| {
                    backend.create_render_bundle(
                        region,
                        pipelines.get(region),
                        bind_group,
                        vertices,
                        QUAD_VERTEX_COUNT,
                        region.instance_count(visible),
                    )
                });
                self.bundles = Some((key, bundles));
            }
        }
        if let Some((_, bundles)) = self.bundles.as_ref() {
            trace!(
                columns = visible.columns,
                rows = visible.rows,
                "submitting frame"
            );
            self.backend.submit(bundles)?;
        }
        Ok(())
    }
}

fn upload_storage<B: GpuBackend>(
    backend: &mut B,
    storage: &mut StorageBuffer<B::Buffer>,
    generation: &mut u64,
    label: &str,
    bytes: &[u8],
) -> Result<()> {
    let size = bytes.len() as u64;
    if size > storage.capacity {
        storage.buffer = backend.create_storage_buffer(label, size)?;
        storage.capacity = size;
        *generation += 1;
        debug!(label, size, generation = *generation, "storage buffer reallocated");
    }
    backend.write_buffer(&storage.buffer, 0, bytes);
    Ok(())
}
