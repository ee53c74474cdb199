//! Common test utilities: a recording GPU backend and grid builders.
//!
//! `RecordingBackend` hands out numbered handles and logs every call, so
//! tests can assert on allocation, bind-group reuse and submission order
//! without a GPU.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gpugrid::render::{DrawRegion, GpuBackend};
use gpugrid::types::{
    shared_states, CanvasSize, FocusState, GridConfig, GridSize, HeaderOffset, SelectState,
    SharedStates,
};
use gpugrid::viewer::{Grid, ViewportStates};
use gpugrid::Result;

/// Handle returned for every created object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateUniform { id: usize, label: String, size: u64 },
    CreateStorage { id: usize, label: String, size: u64 },
    CreateVertex { id: usize, label: String, len: usize },
    Write { buffer: usize, offset: u64, len: usize },
    CreateBindGroup { id: usize, buffers: [usize; 5] },
    CreatePipeline { id: usize, region: DrawRegion },
    CreateBundle {
        id: usize,
        region: DrawRegion,
        bind_group: usize,
        instances: u32,
    },
    Submit { bundles: Vec<usize> },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: usize,
    pub calls: Vec<Call>,
    /// Last bytes written to each buffer.
    pub contents: HashMap<usize, Vec<u8>>,
    /// Most recent buffer id per label.
    pub labels: HashMap<String, usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn buffer(&mut self, label: &str) -> Handle {
        let id = self.next();
        self.labels.insert(label.to_string(), id);
        Handle(id)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn bind_groups_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateBindGroup { .. }))
    }

    pub fn bundles_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateBundle { .. }))
    }

    pub fn storage_created(&self, label: &str) -> usize {
        self.count(|c| matches!(c, Call::CreateStorage { label: l, .. } if l == label))
    }

    pub fn submits(&self) -> Vec<Vec<usize>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Submit { bundles } => Some(bundles.clone()),
                _ => None,
            })
            .collect()
    }

    /// Regions and instance counts of the most recently recorded bundles.
    pub fn last_bundles(&self) -> Vec<(DrawRegion, u32)> {
        let mut recorded: Vec<(DrawRegion, u32)> = self
            .calls
            .iter()
            .rev()
            .filter_map(|c| match c {
                Call::CreateBundle {
                    region, instances, ..
                } => Some((*region, *instances)),
                _ => None,
            })
            .take(3)
            .collect();
        recorded.reverse();
        recorded
    }

    /// Words last written to the buffer currently carrying `label`.
    pub fn words(&self, label: &str) -> Vec<u32> {
        let id = self.labels[label];
        self.contents[&id]
            .chunks_exact(4)
            .map(|w| u32::from_ne_bytes(w.try_into().unwrap()))
            .collect()
    }

    /// Floats last written to the buffer currently carrying `label`.
    pub fn floats(&self, label: &str) -> Vec<f32> {
        let id = self.labels[label];
        self.contents[&id]
            .chunks_exact(4)
            .map(|w| f32::from_ne_bytes(w.try_into().unwrap()))
            .collect()
    }
}

impl GpuBackend for RecordingBackend {
    type Buffer = Handle;
    type BindGroup = Handle;
    type Pipeline = Handle;
    type Bundle = Handle;

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<Handle> {
        let handle = self.buffer(label);
        self.calls.push(Call::CreateUniform {
            id: handle.0,
            label: label.to_string(),
            size,
        });
        Ok(handle)
    }

    fn create_storage_buffer(&mut self, label: &str, size: u64) -> Result<Handle> {
        let handle = self.buffer(label);
        self.calls.push(Call::CreateStorage {
            id: handle.0,
            label: label.to_string(),
            size,
        });
        Ok(handle)
    }

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> Result<Handle> {
        let handle = self.buffer(label);
        self.contents.insert(handle.0, contents.to_vec());
        self.calls.push(Call::CreateVertex {
            id: handle.0,
            label: label.to_string(),
            len: contents.len(),
        });
        Ok(handle)
    }

    fn write_buffer(&mut self, buffer: &Handle, offset: u64, data: &[u8]) {
        self.contents.insert(buffer.0, data.to_vec());
        self.calls.push(Call::Write {
            buffer: buffer.0,
            offset,
            len: data.len(),
        });
    }

    fn create_bind_group(&mut self, buffers: [&Handle; 5]) -> Handle {
        let id = self.next();
        self.calls.push(Call::CreateBindGroup {
            id,
            buffers: buffers.map(|b| b.0),
        });
        Handle(id)
    }

    fn create_pipeline(&mut self, region: DrawRegion) -> Result<Handle> {
        let id = self.next();
        self.calls.push(Call::CreatePipeline { id, region });
        Ok(Handle(id))
    }

    fn create_render_bundle(
        &mut self,
        region: DrawRegion,
        _pipeline: &Handle,
        bind_group: &Handle,
        _vertices: &Handle,
        _vertex_count: u32,
        instance_count: u32,
    ) -> Handle {
        let id = self.next();
        self.calls.push(Call::CreateBundle {
            id,
            region,
            bind_group: bind_group.0,
            instances: instance_count,
        });
        Handle(id)
    }

    fn submit(&mut self, bundles: &[Handle]) -> Result<()> {
        self.calls.push(Call::Submit {
            bundles: bundles.iter().map(|b| b.0).collect(),
        });
        Ok(())
    }
}

/// Caller-owned arrays shared by sibling grids.
pub struct Shared {
    pub focused: SharedStates<FocusState>,
    pub selected: SharedStates<SelectState>,
}

impl Shared {
    pub fn new(len: usize) -> Self {
        Self {
            focused: shared_states(len),
            selected: shared_states(len),
        }
    }

    pub fn selected(&self) -> Vec<SelectState> {
        self.selected.borrow().clone()
    }

    pub fn focused(&self) -> Vec<FocusState> {
        self.focused.borrow().clone()
    }
}

/// `columns × rows` grid on a square canvas with equal header offsets.
pub fn config(columns: u32, rows: u32, canvas: f64, header: f64) -> GridConfig {
    GridConfig::new(
        GridSize::new(columns, rows),
        CanvasSize {
            width: canvas,
            height: canvas,
        },
        HeaderOffset {
            left: header,
            top: header,
        },
    )
}

/// Cell values `0, 1, 2, ...` for a `columns × rows` grid.
pub fn ramp(columns: u32, rows: u32) -> Vec<f32> {
    (0..columns * rows).map(|i| i as f32).collect()
}

pub fn build(config: &GridConfig, shared: &Shared) -> Grid<RecordingBackend> {
    build_with_viewports(config, shared, None)
}

pub fn build_with_viewports(
    config: &GridConfig,
    shared: &Shared,
    viewports: Option<ViewportStates>,
) -> Grid<RecordingBackend> {
    let size = config.grid_size;
    Grid::new(
        config,
        RecordingBackend::new(),
        &ramp(size.num_columns, size.num_rows),
        Rc::clone(&shared.focused),
        Rc::clone(&shared.selected),
        viewports,
    )
    .expect("grid builds")
}

/// 10×10 grid, 120px canvas, 20px headers: 10px cells when fully zoomed out.
pub fn standard() -> (Grid<RecordingBackend>, Shared) {
    let shared = Shared::new(10);
    let grid = build(&config(10, 10, 120.0, 20.0), &shared);
    (grid, shared)
}

/// Records every callback invocation as `(source, column, row)`.
pub fn recorder() -> (
    Rc<RefCell<Vec<(u32, i32, i32)>>>,
    gpugrid::viewer::ChangeCallback,
) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (
        log,
        Box::new(move |source, column, row| sink.borrow_mut().push((source.0, column, row))),
    )
}
