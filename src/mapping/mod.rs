// Road map module

pub mod road_map;

pub use road_map::*;
