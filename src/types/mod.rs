//! Data types shared by the grid viewer.

mod config;
mod geometry;
mod selection;

pub use config::*;
pub use geometry::*;
pub use selection::*;
