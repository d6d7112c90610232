//! Utility modules for ltv_unicycle

pub mod visualization;

pub use visualization::{Visualizer, PathStyle, colors};
