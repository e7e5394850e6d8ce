//! Error types for highway_planner

use thiserror::Error;

/// Main error type for the planner
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Track table unusable
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// A lane index outside the road
    #[error("Lane {lane} out of range (road has {lane_count} lanes)")]
    LaneOutOfRange { lane: i64, lane_count: usize },

    /// Numerical computation failed (spline fit, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Telemetry frame could not be decoded, or decoded to inconsistent data
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Parameter file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::Protocol(e.to_string())
    }
}
