//! Wire format of the simulator's telemetry payload

use serde::{Deserialize, Serialize};

use crate::common::{
    EgoState, Path2D, PlannerError, PlannerResult, PreviousPath, Telemetry, TrafficVehicle,
};

/// Telemetry payload exactly as sent by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub d: f64,
    /// Heading [deg]
    pub yaw: f64,
    /// Speed [mph]
    pub speed: f64,
    pub previous_path_x: Vec<f64>,
    pub previous_path_y: Vec<f64>,
    pub end_path_s: f64,
    pub end_path_d: f64,
    /// `[id, x, y, vx, vy, s, d]` per vehicle
    pub sensor_fusion: Vec<[f64; 7]>,
}

impl TelemetryMessage {
    /// Convert to planner types, yaw in radians
    pub fn into_telemetry(self) -> PlannerResult<Telemetry> {
        if self.previous_path_x.len() != self.previous_path_y.len() {
            return Err(PlannerError::Protocol(format!(
                "previous path has {} x but {} y values",
                self.previous_path_x.len(),
                self.previous_path_y.len()
            )));
        }

        let ego = EgoState::new(self.x, self.y, self.yaw.to_radians(), self.speed, self.s, self.d);
        let previous = PreviousPath::new(
            Path2D::from_xy(&self.previous_path_x, &self.previous_path_y),
            self.end_path_s,
            self.end_path_d,
        );
        let traffic = self
            .sensor_fusion
            .iter()
            .map(|f| TrafficVehicle::new(f[0] as i64, f[1], f[2], f[3], f[4], f[5], f[6]))
            .collect();

        Ok(Telemetry { ego, previous, traffic })
    }
}
