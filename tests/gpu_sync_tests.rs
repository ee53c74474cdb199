//! GPU resource synchronization tests
//!
//! Buffer reuse, reallocation, bind-group invalidation and render-bundle
//! caching against the recording backend.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::rc::Rc;

use common::{config, standard, Call, RecordingBackend, Shared};
use gpugrid::layout::VisibleCells;
use gpugrid::render::{DrawRegion, GpuResourceSync};
use gpugrid::types::{GridSize, SelectState};
use gpugrid::viewer::Grid;
use gpugrid::Point;

fn sync(columns: u32, rows: u32) -> GpuResourceSync<RecordingBackend> {
    GpuResourceSync::new(RecordingBackend::new(), GridSize::new(columns, rows)).unwrap()
}

fn visible(columns: u32, rows: u32) -> VisibleCells {
    VisibleCells { columns, rows }
}

#[test]
fn test_new_allocates_every_buffer_and_pipeline() {
    let s = sync(4, 6);
    let backend = s.backend();
    assert_eq!(backend.storage_created("GridData"), 1);
    assert_eq!(backend.storage_created("FocusedIndices"), 1);
    assert_eq!(backend.storage_created("SelectedIndices"), 1);
    assert_eq!(
        backend.count(|c| matches!(c, Call::CreatePipeline { .. })),
        3
    );
    assert!(backend
        .calls
        .iter()
        .any(|c| matches!(c, Call::CreateStorage { label, size, .. } if label == "GridData" && *size == 96)));
    assert!(backend
        .calls
        .iter()
        .any(|c| matches!(c, Call::CreateStorage { label, size, .. } if label == "FocusedIndices" && *size == 24)));
    assert!(backend
        .calls
        .iter()
        .any(|c| matches!(c, Call::CreateVertex { len: 48, .. })));
    assert_eq!(s.generation(), 0);
}

#[test]
fn test_bind_group_and_bundles_are_reused() {
    let mut s = sync(4, 4);
    s.render(visible(4, 4)).unwrap();
    s.render(visible(4, 4)).unwrap();

    let backend = s.backend();
    assert_eq!(backend.bind_groups_created(), 1);
    assert_eq!(backend.bundles_created(), 3);
    let submits = backend.submits();
    assert_eq!(submits.len(), 2);
    assert_eq!(submits[0], submits[1]);
    assert_eq!(submits[0].len(), 3);
}

#[test]
fn test_bundles_follow_region_order_and_counts() {
    let mut s = sync(8, 8);
    s.render(visible(3, 5)).unwrap();
    assert_eq!(
        s.backend().last_bundles(),
        vec![
            (DrawRegion::Body, 15),
            (DrawRegion::ColumnHeader, 3),
            (DrawRegion::RowHeader, 5),
        ]
    );
}

#[test]
fn test_visible_change_rerecords_bundles_only() {
    let mut s = sync(8, 8);
    s.render(visible(3, 5)).unwrap();
    s.render(visible(4, 5)).unwrap();

    let backend = s.backend();
    assert_eq!(backend.bind_groups_created(), 1);
    assert_eq!(backend.bundles_created(), 6);
    assert_eq!(backend.last_bundles()[0], (DrawRegion::Body, 20));
}

#[test]
fn test_in_place_upload_keeps_bind_group() {
    let mut s = sync(4, 4);
    s.render(visible(4, 4)).unwrap();
    s.update_data(&[1.0; 16]).unwrap();
    s.update_data(&[2.0; 8]).unwrap();
    s.update_selected(&[SelectState::Selected; 4]).unwrap();
    s.render(visible(4, 4)).unwrap();

    let backend = s.backend();
    assert_eq!(s.generation(), 0);
    assert_eq!(backend.storage_created("GridData"), 1);
    assert_eq!(backend.bind_groups_created(), 1);
    assert_eq!(backend.bundles_created(), 3);
}

#[test]
fn test_growing_upload_reallocates_and_rebinds() {
    let mut s = sync(4, 4);
    s.render(visible(4, 4)).unwrap();
    s.update_data(&[1.0; 32]).unwrap();
    assert_eq!(s.generation(), 1);
    s.render(visible(4, 4)).unwrap();

    let backend = s.backend();
    assert_eq!(backend.storage_created("GridData"), 2);
    assert_eq!(backend.bind_groups_created(), 2);
    assert_eq!(backend.bundles_created(), 6);

    let new_data = backend.labels["GridData"];
    let rebound = backend
        .calls
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::CreateBindGroup { buffers, .. } => Some(*buffers),
            _ => None,
        })
        .unwrap();
    assert_eq!(rebound[2], new_data);
}

#[test]
fn test_bind_group_is_rebuilt_lazily() {
    let mut s = sync(2, 2);
    s.update_data(&[0.0; 8]).unwrap();
    s.update_data(&[0.0; 16]).unwrap();
    assert_eq!(s.generation(), 2);
    assert_eq!(s.backend().bind_groups_created(), 0);
    s.render(visible(2, 2)).unwrap();
    assert_eq!(s.backend().bind_groups_created(), 1);
}

#[test]
fn test_frames_after_hover_reuse_resources() {
    let (mut grid, _) = standard();
    grid.render_frame().unwrap();
    grid.pointer_move(Point::new(45.0, 65.0)).unwrap();
    grid.render_frame().unwrap();

    let backend = grid.sync().backend();
    assert_eq!(backend.bind_groups_created(), 1);
    assert_eq!(backend.bundles_created(), 3);
    assert_eq!(backend.submits().len(), 2);
}

#[test]
fn test_data_uploads_row_major() {
    // 3 columns, 2 rows; value encodes (column, row) as column * 10 + row.
    let (columns, rows) = (3u32, 2u32);
    let mut data = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            data.push((column * 10 + row) as f32);
        }
    }
    let shared = Shared::new(3);
    let grid = Grid::new(
        &config(columns, rows, 120.0, 20.0),
        RecordingBackend::new(),
        &data,
        Rc::clone(&shared.focused),
        Rc::clone(&shared.selected),
        None,
    )
    .unwrap();

    let words = grid.sync().backend().floats("GridData");
    for row in 0..rows {
        for column in 0..columns {
            let index = (row * columns + column) as usize;
            assert_eq!(words[index], (column * 10 + row) as f32);
        }
    }
}

#[test]
fn test_body_shader_indexes_row_major() {
    let shader = include_str!("../src/render/wgpu_backend/shaders/cell.wgsl");
    assert!(shader.contains("grid_data[in.cell.y * counts.num_columns + in.cell.x]"));
}
