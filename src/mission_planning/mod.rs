// Mission planning module

pub mod behavior_planner;

pub use behavior_planner::*;
