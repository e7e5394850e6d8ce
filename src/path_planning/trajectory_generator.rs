//! Spline trajectory generator
//!
//! Turns a target lane and reference speed into a fixed number of points
//! spaced one time step apart. The unconsumed part of the previous trajectory
//! is kept as a prefix and the new points continue from its end, so the motion
//! the vehicle is already committed to is never altered.

use log::{debug, warn};
use nalgebra::{Isometry2, Point2, Vector2};
use serde::Deserialize;

use crate::common::{
    lane_center, EgoState, FrenetFrame, Interpolant, Path2D, PlannerError, PlannerResult, Point2D,
};
use crate::path_planning::cubic_spline::CubicSpline;

/// Prefix points closer than this do not define a heading [m]
const MIN_HEADING_BASE: f64 = 1e-6;

/// Trajectory generator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Number of points in every trajectory
    pub path_len: usize,
    /// Time between consecutive points [s]
    pub time_step: f64,
    /// Longitudinal spacing of the forward spline anchors [m]
    pub anchor_spacing: f64,
    /// Number of forward spline anchors
    pub anchor_count: usize,
    /// Local x distance used to size the steps along the spline [m]
    pub horizon_x: f64,
    /// Reference speed units per m/s (2.24 for mph)
    pub speed_scale: f64,
    /// Lane width [m]
    pub lane_width: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            path_len: 50,
            time_step: 0.02,
            anchor_spacing: 30.0,
            anchor_count: 3,
            horizon_x: 30.0,
            speed_scale: 2.24,
            lane_width: 4.0,
        }
    }
}

/// Local frame the spline is fitted in
#[derive(Debug, Clone, Copy)]
struct ReferenceFrame {
    /// Local -> world transform
    pose: Isometry2<f64>,
    /// Continuity anchor behind the reference point
    prev: Point2D,
    /// Reference point itself
    origin: Point2D,
}

impl ReferenceFrame {
    fn to_local(&self, p: &Point2D) -> Point2<f64> {
        self.pose.inverse_transform_point(&p.to_point())
    }

    fn to_world(&self, x: f64, y: f64) -> Point2D {
        Point2D::from(self.pose.transform_point(&Point2::new(x, y)))
    }
}

/// Lane-following trajectory generator
#[derive(Debug, Clone)]
pub struct TrajectoryGenerator {
    config: TrajectoryConfig,
}

impl TrajectoryGenerator {
    pub fn new(config: TrajectoryConfig) -> PlannerResult<Self> {
        if config.path_len == 0 || config.anchor_count == 0 {
            return Err(PlannerError::InvalidParameter(
                "path_len and anchor_count must be at least 1".to_string(),
            ));
        }
        let positive = [
            config.time_step,
            config.anchor_spacing,
            config.horizon_x,
            config.speed_scale,
            config.lane_width,
        ];
        if positive.iter().any(|v| !(*v > 0.0)) {
            return Err(PlannerError::InvalidParameter(format!(
                "trajectory parameters must be positive: {:?}",
                config
            )));
        }
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self { config: TrajectoryConfig::default() }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Generate a trajectory with the cubic spline
    pub fn generate_default<F: FrenetFrame>(
        &self,
        frame: &F,
        ego: &EgoState,
        car_s: f64,
        prefix: &Path2D,
        lane: usize,
        reference_speed: f64,
    ) -> PlannerResult<Path2D> {
        self.generate::<F, CubicSpline>(frame, ego, car_s, prefix, lane, reference_speed)
    }

    /// Generate `path_len` points: the kept prefix followed by new points
    /// along a curve through the continuity anchors and the forward anchors
    /// in the centre of `lane`.
    ///
    /// # Arguments
    /// * `car_s` - Frenet s the forward anchors are measured from (end of prefix)
    /// * `prefix` - Unconsumed points of the previous trajectory
    /// * `reference_speed` - Speed the new points are spaced for [mph]
    pub fn generate<F: FrenetFrame, S: Interpolant>(
        &self,
        frame: &F,
        ego: &EgoState,
        car_s: f64,
        prefix: &Path2D,
        lane: usize,
        reference_speed: f64,
    ) -> PlannerResult<Path2D> {
        let path_len = self.config.path_len;
        let prefix: &[Point2D] = if prefix.len() > path_len {
            warn!("Previous path has {} points, keeping the first {}", prefix.len(), path_len);
            &prefix.points[..path_len]
        } else {
            &prefix.points
        };

        let reference = self.reference_frame(ego, prefix);
        let spline = self.fit_spline::<F, S>(frame, &reference, car_s, lane)?;

        let mut trajectory = Path2D::with_capacity(path_len);
        for p in prefix {
            trajectory.push(*p);
        }

        let step_x = self.step_x(&spline, reference_speed);
        let missing = path_len - prefix.len();
        for i in 1..=missing {
            let x = step_x * i as f64;
            trajectory.push(reference.to_world(x, spline.eval(x)));
        }

        debug!(
            "Trajectory: {} kept + {} new, lane {}, step {:.3} m",
            prefix.len(), missing, lane, step_x
        );
        Ok(trajectory)
    }

    /// Anchor the local frame at the end of the prefix, heading along its last step
    fn reference_frame(&self, ego: &EgoState, prefix: &[Point2D]) -> ReferenceFrame {
        let n = prefix.len();
        if n >= 2 {
            let last = prefix[n - 1];
            let before = prefix[n - 2];
            if last.distance(&before) > MIN_HEADING_BASE {
                let yaw = (last.y - before.y).atan2(last.x - before.x);
                return ReferenceFrame {
                    pose: Isometry2::new(last.to_vector(), yaw),
                    prev: before,
                    origin: last,
                };
            }
        }

        // No usable heading in the prefix: take the reported yaw
        let origin = prefix.last().copied().unwrap_or_else(|| ego.position());
        let prev = Point2D::new(origin.x - ego.yaw.cos(), origin.y - ego.yaw.sin());
        ReferenceFrame {
            pose: Isometry2::new(origin.to_vector(), ego.yaw),
            prev,
            origin,
        }
    }

    /// Fit the curve through the two continuity anchors and the forward anchors, in local coordinates
    fn fit_spline<F: FrenetFrame, S: Interpolant>(
        &self,
        frame: &F,
        reference: &ReferenceFrame,
        car_s: f64,
        lane: usize,
    ) -> PlannerResult<S> {
        let d = lane_center(lane, self.config.lane_width);

        let mut anchors = vec![reference.prev, reference.origin];
        anchors.extend((1..=self.config.anchor_count).map(|k| {
            frame.to_cartesian(car_s + self.config.anchor_spacing * k as f64, d)
        }));

        let local: Vec<Point2<f64>> = anchors.iter().map(|p| reference.to_local(p)).collect();
        let xs: Vec<f64> = local.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = local.iter().map(|p| p.y).collect();
        S::fit(&xs, &ys)
    }

    /// Local x increment covering one time step at `reference_speed`.
    ///
    /// The arc length to `horizon_x` is approximated by the straight chord.
    fn step_x<S: Interpolant>(&self, spline: &S, reference_speed: f64) -> f64 {
        let speed = reference_speed.max(0.0) / self.config.speed_scale;
        let target_x = self.config.horizon_x;
        let target_y = spline.eval(target_x);
        let target_dist = Vector2::new(target_x, target_y).norm();
        if speed <= 0.0 || target_dist <= 0.0 {
            return 0.0;
        }
        let n = target_dist / (self.config.time_step * speed);
        target_x / n
    }
}

impl Default for TrajectoryGenerator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
