//! GPU buffer layouts.
//!
//! All types are `#[repr(C)]` + `bytemuck::Pod + Zeroable` for safe GPU upload.

use bytemuck::{Pod, Zeroable};

use crate::layout::{Viewport, VisibleCells};
use crate::types::{GeometryState, GridSize, Offset, ScrollbarFocus};

/// Float parameters, binding 0. Field order matches `F32Uniforms` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct F32Uniforms {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub header_left: f32,
    pub header_top: f32,
    pub viewport_left: f32,
    pub viewport_top: f32,
    pub viewport_right: f32,
    pub viewport_bottom: f32,
    pub overscroll_x: f32,
    pub overscroll_y: f32,
    pub scrollbar_radius: f32,
    pub scrollbar_margin: f32,
    pub num_columns: f32,
    pub num_rows: f32,
    /// Rounds the block up to 16 bytes.
    pub _padding: [f32; 2],
}

impl F32Uniforms {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(geometry: &GeometryState, viewport: &Viewport, overscroll: Offset) -> Self {
        Self {
            canvas_width: geometry.canvas_size.width as f32,
            canvas_height: geometry.canvas_size.height as f32,
            header_left: geometry.header_offset.left as f32,
            header_top: geometry.header_offset.top as f32,
            viewport_left: viewport.left as f32,
            viewport_top: viewport.top as f32,
            viewport_right: viewport.right as f32,
            viewport_bottom: viewport.bottom as f32,
            overscroll_x: overscroll.x as f32,
            overscroll_y: overscroll.y as f32,
            scrollbar_radius: geometry.scroll_bar.radius as f32,
            scrollbar_margin: geometry.scroll_bar.margin as f32,
            num_columns: geometry.grid_size.num_columns as f32,
            num_rows: geometry.grid_size.num_rows as f32,
            _padding: [0.0; 2],
        }
    }
}

/// Integer parameters, binding 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct U32Uniforms {
    pub num_columns: u32,
    pub visible_columns: u32,
    pub visible_rows: u32,
    /// [`ScrollbarFocus::bits`].
    pub scrollbar_focus: u32,
}

impl U32Uniforms {
    pub fn new(grid: GridSize, visible: VisibleCells, focus: ScrollbarFocus) -> Self {
        Self {
            num_columns: grid.num_columns,
            visible_columns: visible.columns,
            visible_rows: visible.rows,
            scrollbar_focus: focus.bits(),
        }
    }
}

/// Unit quad as two triangles, shared by all three draws.
pub const QUAD_VERTICES: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Byte size of `count` 32-bit words, at least one word so empty arrays
/// still get a bindable buffer.
pub fn word_buffer_size(count: usize) -> u64 {
    (count.max(1) as u64) * 4
}
