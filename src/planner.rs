//! One planning cycle: behaviour decision followed by trajectory generation

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::common::{FrenetFrame, Path2D, PlannerError, PlannerResult, PlannerState, Telemetry};
use crate::mapping::{RoadConfig, RoadMap};
use crate::mission_planning::{BehaviorConfig, BehaviorDecision, BehaviorPlanner};
use crate::path_planning::{TrajectoryConfig, TrajectoryGenerator};
use crate::utils::params;

/// Full planner configuration, as read from the parameter file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub road: RoadConfig,
    pub behavior: BehaviorConfig,
    pub trajectory: TrajectoryConfig,
}

impl PlannerConfig {
    /// Load a TOML parameter file; missing keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        params::load(path)
    }
}

/// Result of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutput {
    /// Decision state for the next cycle
    pub state: PlannerState,
    pub trajectory: Path2D,
    pub decision: BehaviorDecision,
}

/// Behaviour planner and trajectory generator over one road
#[derive(Debug, Clone)]
pub struct HighwayPlanner<F: FrenetFrame = RoadMap> {
    frame: F,
    behavior: BehaviorPlanner,
    generator: TrajectoryGenerator,
}

impl<F: FrenetFrame> HighwayPlanner<F> {
    /// Both halves must agree on the lane geometry and the tick length, or
    /// vehicles would be sorted into lanes the trajectory does not aim for.
    pub fn new(frame: F, behavior: BehaviorConfig, trajectory: TrajectoryConfig) -> PlannerResult<Self> {
        if behavior.lane_width != trajectory.lane_width {
            return Err(PlannerError::InvalidParameter(format!(
                "behavior.lane_width ({}) and trajectory.lane_width ({}) differ",
                behavior.lane_width, trajectory.lane_width
            )));
        }
        if behavior.time_step != trajectory.time_step {
            return Err(PlannerError::InvalidParameter(format!(
                "behavior.time_step ({}) and trajectory.time_step ({}) differ",
                behavior.time_step, trajectory.time_step
            )));
        }
        let behavior = BehaviorPlanner::new(behavior, frame.max_s())?;
        let generator = TrajectoryGenerator::new(trajectory)?;
        Ok(Self { frame, behavior, generator })
    }

    pub fn with_defaults(frame: F) -> PlannerResult<Self> {
        Self::new(frame, BehaviorConfig::default(), TrajectoryConfig::default())
    }

    pub fn frame(&self) -> &F {
        &self.frame
    }

    pub fn behavior(&self) -> &BehaviorPlanner {
        &self.behavior
    }

    pub fn generator(&self) -> &TrajectoryGenerator {
        &self.generator
    }

    /// Plan one cycle from `state`. The input state is left untouched; the
    /// caller adopts `CycleOutput::state` once the cycle has succeeded.
    pub fn plan_cycle(&self, state: &PlannerState, telemetry: &Telemetry) -> PlannerResult<CycleOutput> {
        let decision = self.behavior.plan(state, &telemetry.ego, &telemetry.previous, &telemetry.traffic)?;
        let trajectory = self.generator.generate_default(
            &self.frame,
            &telemetry.ego,
            decision.assessment.car_s,
            &telemetry.previous.path,
            decision.state.lane,
            decision.state.reference_speed,
        )?;
        Ok(CycleOutput { state: decision.state, trajectory, decision })
    }
}

/// Planner plus the decision state it carries between cycles
#[derive(Debug, Clone)]
pub struct PlannerSession<F: FrenetFrame = RoadMap> {
    planner: HighwayPlanner<F>,
    state: PlannerState,
    cycles: u64,
}

impl<F: FrenetFrame> PlannerSession<F> {
    /// Start in the middle lane at standstill
    pub fn new(planner: HighwayPlanner<F>) -> Self {
        Self::with_state(planner, PlannerState::default())
    }

    pub fn with_state(planner: HighwayPlanner<F>, state: PlannerState) -> Self {
        Self { planner, state, cycles: 0 }
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn planner(&self) -> &HighwayPlanner<F> {
        &self.planner
    }

    /// Number of completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle; the state only advances if the whole cycle succeeds.
    pub fn step(&mut self, telemetry: &Telemetry) -> PlannerResult<Path2D> {
        let out = self.planner.plan_cycle(&self.state, telemetry)?;
        debug!(
            "Cycle {}: lane {} -> {}, reference speed {:.2}",
            self.cycles, self.state.lane, out.state.lane, out.state.reference_speed
        );
        self.state = out.state;
        self.cycles += 1;
        Ok(out.trajectory)
    }
}
