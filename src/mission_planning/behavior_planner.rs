/*!
 * Behaviour planner for highway driving
 *
 * Decides once per cycle whether to keep the lane, slow down, or move to an
 * adjacent lane, from the ego position and constant-velocity predictions of
 * the surrounding traffic. The decision state (lane, reference speed) is
 * passed in and handed back; nothing is stored between calls.
 */

use log::{debug, info};
use serde::Deserialize;

use crate::common::{
    frenet_gap, lane_index, EgoState, PlannerError, PlannerResult, PlannerState, PreviousPath,
    TrafficVehicle,
};

/// Behaviour planner configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Lane width [m]
    pub lane_width: f64,
    /// Number of lanes in the driving direction
    pub lane_count: usize,
    /// Longitudinal gap below which a vehicle blocks a lane [m]
    pub safety_gap: f64,
    /// Upper bound for the reference speed [mph]
    pub speed_limit: f64,
    /// Reference speed increase per cycle [mph]
    pub accel_step: f64,
    /// Reference speed decrease per cycle [mph]
    pub decel_step: f64,
    /// Time between trajectory points [s]
    pub time_step: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            lane_width: 4.0,
            lane_count: 3,
            safety_gap: 25.0,
            speed_limit: 48.9,
            accel_step: 0.20,
            decel_step: 0.224,
            time_step: 0.02,
        }
    }
}

/// What the planner saw around the ego vehicle this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficAssessment {
    /// Ego s the decision was made for
    pub car_s: f64,
    /// A vehicle in the ego lane is ahead within the safety gap
    pub too_close: bool,
    /// Per lane: free to move into. The ego lane is always `false`.
    pub open_lanes: Vec<bool>,
}

/// Outcome of one behaviour cycle
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDecision {
    pub state: PlannerState,
    pub assessment: TrafficAssessment,
}

/// Lane keeping / lane change / speed decision maker
#[derive(Debug, Clone)]
pub struct BehaviorPlanner {
    config: BehaviorConfig,
    max_s: f64,
}

impl BehaviorPlanner {
    /// Create a planner for a loop of length `max_s`
    pub fn new(config: BehaviorConfig, max_s: f64) -> PlannerResult<Self> {
        if config.lane_count == 0 {
            return Err(PlannerError::InvalidParameter("lane_count must be at least 1".to_string()));
        }
        if !(config.lane_width > 0.0 && config.time_step > 0.0 && max_s > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "lane_width, time_step and max_s must be positive (got {}, {}, {})",
                config.lane_width, config.time_step, max_s
            )));
        }
        if config.speed_limit < 0.0 || config.accel_step < 0.0 || config.decel_step < 0.0 {
            return Err(PlannerError::InvalidParameter(
                "speed_limit, accel_step and decel_step must not be negative".to_string(),
            ));
        }
        Ok(Self { config, max_s })
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Lane of a lateral offset, rejected if it is off the road
    pub fn lane_of(&self, d: f64) -> PlannerResult<usize> {
        let lane = lane_index(d, self.config.lane_width);
        if lane < 0 || lane >= self.config.lane_count as i64 {
            return Err(PlannerError::LaneOutOfRange { lane, lane_count: self.config.lane_count });
        }
        Ok(lane as usize)
    }

    /// Classify the traffic relative to an ego vehicle at `car_s` in `lane`.
    ///
    /// Other vehicles are moved forward by the time it takes to drive the
    /// `prev_len` points still queued, since that is when the new points start.
    pub fn assess(
        &self,
        car_s: f64,
        prev_len: usize,
        traffic: &[TrafficVehicle],
        lane: usize,
    ) -> PlannerResult<TrafficAssessment> {
        if lane >= self.config.lane_count {
            return Err(PlannerError::LaneOutOfRange {
                lane: lane as i64,
                lane_count: self.config.lane_count,
            });
        }

        let horizon = prev_len as f64 * self.config.time_step;
        let mut too_close = false;
        let mut open_lanes = vec![true; self.config.lane_count];
        open_lanes[lane] = false;

        for vehicle in traffic {
            let vehicle_lane = self.lane_of(vehicle.d)?;
            let gap = frenet_gap(car_s, vehicle.extrapolated_s(horizon), self.max_s);

            if vehicle_lane == lane {
                if gap > 0.0 && gap < self.config.safety_gap {
                    debug!("Vehicle {} ahead in lane {} at {:.1} m", vehicle.id, lane, gap);
                    too_close = true;
                }
            } else if gap.abs() < self.config.safety_gap {
                open_lanes[vehicle_lane] = false;
            }
        }

        Ok(TrafficAssessment { car_s, too_close, open_lanes })
    }

    /// Next decision state from the current one and this cycle's assessment
    pub fn decide(&self, state: &PlannerState, assessment: &TrafficAssessment) -> PlannerState {
        let mut next = *state;

        if assessment.too_close {
            next.reference_speed = (state.reference_speed - self.config.decel_step).max(0.0);

            // First open neighbour in ascending lane order, never more than one lane
            let target = assessment
                .open_lanes
                .iter()
                .enumerate()
                .find(|&(i, &open)| open && (i as i64 - state.lane as i64).abs() == 1)
                .map(|(i, _)| i);
            if let Some(lane) = target {
                info!("Changing lane {} -> {}", state.lane, lane);
                next.lane = lane;
            } else {
                debug!("Blocked in lane {}, slowing to {:.2}", state.lane, next.reference_speed);
            }
        } else if state.reference_speed < self.config.speed_limit {
            next.reference_speed = (state.reference_speed + self.config.accel_step).min(self.config.speed_limit);
        }

        // Keep the reference speed inside its bounds even for an out-of-range input state
        next.reference_speed = next.reference_speed.clamp(0.0, self.config.speed_limit);
        next
    }

    /// Run one behaviour cycle
    pub fn plan(
        &self,
        state: &PlannerState,
        ego: &EgoState,
        previous: &PreviousPath,
        traffic: &[TrafficVehicle],
    ) -> PlannerResult<BehaviorDecision> {
        // Plan from where the queued points leave the car, not from where it is now
        let car_s = if previous.is_empty() { ego.s } else { previous.end_s };
        let assessment = self.assess(car_s, previous.len(), traffic, state.lane)?;
        let next = self.decide(state, &assessment);
        debug!(
            "car_s={:.1} too_close={} open={:?} lane {} -> {} speed {:.2} -> {:.2}",
            car_s, assessment.too_close, assessment.open_lanes,
            state.lane, next.lane, state.reference_speed, next.reference_speed
        );
        Ok(BehaviorDecision { state: next, assessment })
    }
}
