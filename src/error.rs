//! Structured error types for gpugrid.
//!
//! Usage errors (no active drag, torn-down instance, missing backend) are
//! surfaced here instead of being swallowed. Out-of-bounds viewports are not
//! errors: they are corrected by clamping.

/// All errors that can occur while driving or rendering a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Drag-delta computation was requested while no pointer is down.
    #[error("no drag is active")]
    DragInactive,

    /// The grid was torn down and must not be mutated any more.
    #[error("grid instance has been torn down")]
    TornDown,

    /// The rendering backend could not be obtained.
    #[error("GPU backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The cell data array does not match the grid size.
    #[error("data length {actual} does not match grid size (expected {expected})")]
    DataLength { expected: usize, actual: usize },

    /// A focus/selection state array does not match the shared index space.
    #[error("{name} length {actual} does not match index space (expected {expected})")]
    StateLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Construction parameters violate a geometric precondition.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be decoded from the host.
    #[error("Config decode: {0}")]
    Config(String),

    /// Frame acquisition or submission failed.
    #[error("Render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
