//! Utility modules for highway_planner

pub mod logger;
pub mod params;
pub mod visualization;

pub use logger::{logger_init, level_from_env};
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
