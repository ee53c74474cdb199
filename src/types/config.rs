//! Construction parameters for a grid instance.

use serde::{Deserialize, Serialize};

use super::geometry::{CanvasSize, GeometryState, GridSize, HeaderOffset, Offset, ScrollBarConfig};
use super::selection::SourceId;
use crate::error::{GridError, Result};
use crate::layout::Viewport;

/// Everything a grid needs besides its data and state arrays.
///
/// Field names are camelCase so a plain JS object can be decoded with
/// `serde-wasm-bindgen`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Identifier passed to every change callback.
    #[serde(default)]
    pub source_id: SourceId,
    pub grid_size: GridSize,
    pub canvas_size: CanvasSize,
    #[serde(default)]
    pub header_offset: HeaderOffset,
    /// Falls back to [`ScrollBarConfig::default`] when absent.
    #[serde(default)]
    pub scroll_bar: Option<ScrollBarConfig>,
    /// Defaults to the whole grid.
    #[serde(default)]
    pub initial_viewport: Option<Viewport>,
    #[serde(default)]
    pub initial_overscroll: Option<Offset>,
}

impl GridConfig {
    pub fn new(grid_size: GridSize, canvas_size: CanvasSize, header_offset: HeaderOffset) -> Self {
        Self {
            source_id: SourceId::default(),
            grid_size,
            canvas_size,
            header_offset,
            scroll_bar: None,
            initial_viewport: None,
            initial_overscroll: None,
        }
    }

    /// Check geometric preconditions.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidConfig`] for empty grids, grids whose cell
    /// count overflows a `u32` index, non-finite sizes, or a canvas with no
    /// body area left after the headers.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size.num_columns == 0 || self.grid_size.num_rows == 0 {
            return Err(GridError::InvalidConfig(format!(
                "grid size must be positive, got {}x{}",
                self.grid_size.num_columns, self.grid_size.num_rows
            )));
        }
        if self.grid_size.cell_count().is_none() {
            return Err(GridError::InvalidConfig(format!(
                "grid size {}x{} exceeds the addressable cell count",
                self.grid_size.num_columns, self.grid_size.num_rows
            )));
        }
        let canvas = self.canvas_size;
        let header = self.header_offset;
        let finite = [canvas.width, canvas.height, header.left, header.top]
            .iter()
            .all(|v| v.is_finite());
        if !finite || header.left < 0.0 || header.top < 0.0 {
            return Err(GridError::InvalidConfig(
                "canvas size and header offset must be finite and non-negative".into(),
            ));
        }
        if canvas.width <= header.left || canvas.height <= header.top {
            return Err(GridError::InvalidConfig(format!(
                "canvas {}x{} leaves no body area after headers {}x{}",
                canvas.width, canvas.height, header.left, header.top
            )));
        }
        if let Some(viewport) = self.initial_viewport {
            if !viewport.is_well_formed() {
                return Err(GridError::InvalidConfig(format!(
                    "initial viewport {viewport:?} is empty or inverted"
                )));
            }
        }
        Ok(())
    }

    /// Geometry with the scroll-bar fallback resolved.
    pub fn geometry(&self) -> GeometryState {
        GeometryState::new(
            self.grid_size,
            self.canvas_size,
            self.header_offset,
            self.scroll_bar,
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn config() -> GridConfig {
        GridConfig::new(
            GridSize::new(5, 5),
            CanvasSize {
                width: 100.0,
                height: 100.0,
            },
            HeaderOffset {
                left: 10.0,
                top: 10.0,
            },
        )
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut c = config();
        c.grid_size.num_rows = 0;
        assert!(matches!(c.validate(), Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn overflowing_cell_count_is_rejected() {
        let mut c = config();
        c.grid_size = GridSize::new(100_000, 100_000);
        assert!(matches!(c.validate(), Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn header_wider_than_canvas_is_rejected() {
        let mut c = config();
        c.header_offset.left = 100.0;
        assert!(matches!(c.validate(), Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn decodes_camel_case_object() {
        let json = r#"{
            "sourceId": 2,
            "gridSize": { "numColumns": 300, "numRows": 40 },
            "canvasSize": { "width": 640, "height": 480 },
            "headerOffset": { "left": 32, "top": 20 },
            "initialViewport": { "left": 0, "top": 0, "right": 20, "bottom": 10 }
        }"#;
        let c: GridConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.source_id, SourceId(2));
        assert_eq!(c.grid_size, GridSize::new(300, 40));
        assert_eq!(c.initial_viewport, Some(Viewport::new(0.0, 0.0, 20.0, 10.0)));
        assert_eq!(c.geometry().scroll_bar, ScrollBarConfig::default());
    }

    #[test]
    fn missing_grid_size_fails_to_decode() {
        let json = r#"{ "canvasSize": { "width": 640, "height": 480 } }"#;
        assert!(serde_json::from_str::<GridConfig>(json).is_err());
    }

    #[test]
    fn inverted_initial_viewport_is_rejected() {
        let mut c = config();
        c.initial_viewport = Some(Viewport::new(3.0, 0.0, 1.0, 2.0));
        assert!(c.validate().is_err());
    }
}
