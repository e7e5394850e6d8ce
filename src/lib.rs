//! highway_planner - behaviour and trajectory planning for highway driving
//!
//! Each planning cycle takes the ego pose, the sensor fusion list and the
//! unconsumed tail of the previous trajectory, decides on a lane and a
//! reference speed, and produces a smooth fixed-length trajectory.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod mission_planning;
pub mod path_planning;
pub mod planner;

// Simulator interface
pub mod bridge;

// Re-export common types for convenience
pub use common::{Point2D, Path2D, Waypoint, EgoState, TrafficVehicle, PreviousPath, PlannerState, Telemetry};
pub use common::{FrenetFrame, Interpolant};
pub use common::{PlannerError, PlannerResult};
pub use mapping::RoadMap;
pub use planner::{CycleOutput, HighwayPlanner, PlannerConfig, PlannerSession};
