use serde::{Deserialize, Serialize};

/// Default scroll-bar handle radius in canvas pixels.
pub const DEFAULT_SCROLLBAR_RADIUS: f64 = 8.0;
/// Default gap between a scroll bar and the canvas edge in canvas pixels.
pub const DEFAULT_SCROLLBAR_MARGIN: f64 = 4.0;

/// Number of columns and rows in the data grid. Fixed for a grid's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSize {
    pub num_columns: u32,
    pub num_rows: u32,
}

impl GridSize {
    pub fn new(num_columns: u32, num_rows: u32) -> Self {
        Self {
            num_columns,
            num_rows,
        }
    }

    /// Length of the shared focus/selection index space.
    pub fn index_space(&self) -> usize {
        self.num_columns.max(self.num_rows) as usize
    }

    /// Number of cells in the dense data array, or `None` when it does not
    /// fit the `u32` index the shader computes (`row * numColumns + column`).
    pub fn cell_count(&self) -> Option<usize> {
        self.num_columns
            .checked_mul(self.num_rows)
            .and_then(|count| usize::try_from(count).ok())
    }

    pub fn columns_f64(&self) -> f64 {
        f64::from(self.num_columns)
    }

    pub fn rows_f64(&self) -> f64 {
        f64::from(self.num_rows)
    }
}

/// Canvas size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Width of the row header strip (`left`) and height of the column header strip (`top`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderOffset {
    pub left: f64,
    pub top: f64,
}

/// Scroll-bar geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollBarConfig {
    pub radius: f64,
    pub margin: f64,
}

impl Default for ScrollBarConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SCROLLBAR_RADIUS,
            margin: DEFAULT_SCROLLBAR_MARGIN,
        }
    }
}

/// A width/height pair, in data units or pixels depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A 2D vector. Used for overscroll (pixels) and velocity (data units per tick).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when either component's magnitude exceeds `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.x.abs() > threshold || self.y.abs() > threshold
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// A pointer position in canvas-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Immutable geometry of one grid instance.
///
/// The scroll-bar fallback is resolved exactly once, when this is built, so
/// every hit test and uniform upload sees the same radius and margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryState {
    pub grid_size: GridSize,
    pub canvas_size: CanvasSize,
    pub header_offset: HeaderOffset,
    pub scroll_bar: ScrollBarConfig,
}

impl GeometryState {
    pub fn new(
        grid_size: GridSize,
        canvas_size: CanvasSize,
        header_offset: HeaderOffset,
        scroll_bar: Option<ScrollBarConfig>,
    ) -> Self {
        Self {
            grid_size,
            canvas_size,
            header_offset,
            scroll_bar: scroll_bar.unwrap_or_default(),
        }
    }

    /// Pixel extent of the scrollable body (canvas minus header strips).
    pub fn body_extent(&self) -> Extent {
        Extent::new(
            self.canvas_size.width - self.header_offset.left,
            self.canvas_size.height - self.header_offset.top,
        )
    }

    /// Grid extent in data units.
    pub fn grid_extent(&self) -> Extent {
        Extent::new(self.grid_size.columns_f64(), self.grid_size.rows_f64())
    }
}
