//! Common types used throughout highway_planner

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn to_point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Point2<f64>> for Point2D {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Path represented as a sequence of 2D points
///
/// Used both for the trajectory handed back to the simulator and for the
/// unconsumed prefix of the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { points: Vec::with_capacity(n) }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Build a path from parallel coordinate lists, pairing up to the shorter one.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        let points = x.iter().zip(y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}

/// One row of the track table: position, arc length and the unit normal
/// pointing towards increasing d.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, s: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, s, dx, dy }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.dx, self.dy)
    }
}

/// Ego vehicle localisation for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoState {
    pub x: f64,
    pub y: f64,
    /// Heading [rad]
    pub yaw: f64,
    /// Reported speed [mph]
    pub speed: f64,
    pub s: f64,
    pub d: f64,
}

impl EgoState {
    pub fn new(x: f64, y: f64, yaw: f64, speed: f64, s: f64, d: f64) -> Self {
        Self { x, y, yaw, speed, s, d }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Another road user reported by sensor fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficVehicle {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    /// Velocity [m/s]
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

impl TrafficVehicle {
    pub fn new(id: i64, x: f64, y: f64, vx: f64, vy: f64, s: f64, d: f64) -> Self {
        Self { id, x, y, vx, vy, s, d }
    }

    pub fn speed(&self) -> f64 {
        (self.vx.powi(2) + self.vy.powi(2)).sqrt()
    }

    /// Constant velocity estimate of s after `dt` seconds
    pub fn extrapolated_s(&self, dt: f64) -> f64 {
        self.s + dt * self.speed()
    }
}

/// Unconsumed tail of the previously issued trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousPath {
    pub path: Path2D,
    /// Frenet s of the last point
    pub end_s: f64,
    /// Frenet d of the last point
    pub end_d: f64,
}

impl PreviousPath {
    pub fn new(path: Path2D, end_s: f64, end_d: f64) -> Self {
        Self { path, end_s, end_d }
    }

    pub fn empty() -> Self {
        Self { path: Path2D::new(), end_s: 0.0, end_d: 0.0 }
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Decision state carried from one cycle to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerState {
    pub lane: usize,
    /// Target cruising speed [mph]
    pub reference_speed: f64,
}

impl PlannerState {
    pub fn new(lane: usize, reference_speed: f64) -> Self {
        Self { lane, reference_speed }
    }
}

impl Default for PlannerState {
    fn default() -> Self {
        Self { lane: 1, reference_speed: 0.0 }
    }
}

/// Everything the simulator reports for one planning cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub ego: EgoState,
    pub previous: PreviousPath,
    pub traffic: Vec<TrafficVehicle>,
}

/// Lane index containing lateral offset `d`, not range checked.
pub fn lane_index(d: f64, lane_width: f64) -> i64 {
    (d / lane_width).floor() as i64
}

/// Lateral offset of the centre of `lane`
pub fn lane_center(lane: usize, lane_width: f64) -> f64 {
    lane_width / 2.0 + lane_width * lane as f64
}

/// Signed longitudinal distance from `from` to `to` on a loop of length `max_s`,
/// folded into (-max_s / 2, max_s / 2].
pub fn frenet_gap(from: f64, to: f64, max_s: f64) -> f64 {
    let half = max_s / 2.0;
    let gap = (to - from).rem_euclid(max_s);
    if gap > half {
        gap - max_s
    } else {
        gap
    }
}
