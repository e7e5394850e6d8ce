//! Track waypoint table and Frenet conversion
//!
//! The track is a closed loop: arc length runs from 0 up to `max_s` and the
//! segment after the last waypoint leads back to the first one.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use itertools::Itertools;
use log::debug;
use nalgebra::Vector2;
use serde::Deserialize;

use crate::common::{FrenetFrame, PlannerError, PlannerResult, Point2D, Waypoint};

/// Road parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Arc length at which s wraps back to 0
    pub max_s: f64,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self { max_s: 6945.554 }
    }
}

/// Static table of track waypoints ordered by s
#[derive(Debug, Clone)]
pub struct RoadMap {
    waypoints: Vec<Waypoint>,
    max_s: f64,
}

impl RoadMap {
    /// Build a map from waypoints already ordered by increasing s
    pub fn new(waypoints: Vec<Waypoint>, max_s: f64) -> PlannerResult<Self> {
        if waypoints.is_empty() {
            return Err(PlannerError::InvalidMap("waypoint table is empty".to_string()));
        }
        if !(max_s.is_finite() && max_s > 0.0) {
            return Err(PlannerError::InvalidMap(format!("max_s must be positive, got {}", max_s)));
        }
        if let Some((i, _)) = waypoints.iter().enumerate().find(|(_, w)| {
            ![w.x, w.y, w.s, w.dx, w.dy].iter().all(|v| v.is_finite())
        }) {
            return Err(PlannerError::InvalidMap(format!("waypoint {} is not finite", i)));
        }
        if let Some((i, (a, b))) = waypoints.iter().tuple_windows().enumerate().find(|(_, (a, b))| b.s <= a.s) {
            return Err(PlannerError::InvalidMap(format!(
                "s must increase: waypoint {} has s={} after s={}",
                i + 1, b.s, a.s
            )));
        }
        let first_s = waypoints[0].s;
        let last_s = waypoints[waypoints.len() - 1].s;
        if first_s < 0.0 || last_s >= max_s {
            return Err(PlannerError::InvalidMap(format!(
                "waypoint s range [{}, {}] outside [0, {})",
                first_s, last_s, max_s
            )));
        }

        Ok(Self { waypoints, max_s })
    }

    /// Parse `x y s dx dy` records, one per line
    pub fn from_reader<R: BufRead>(reader: R, max_s: f64) -> PlannerResult<Self> {
        let mut waypoints = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<f64> = line
                .split_whitespace()
                .map(|f| f.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| PlannerError::InvalidMap(format!("line {}: {}", i + 1, e)))?;
            if fields.len() != 5 {
                return Err(PlannerError::InvalidMap(format!(
                    "line {}: expected 5 fields, found {}",
                    i + 1,
                    fields.len()
                )));
            }
            waypoints.push(Waypoint::new(fields[0], fields[1], fields[2], fields[3], fields[4]));
        }
        debug!("Loaded {} map waypoints", waypoints.len());
        Self::new(waypoints, max_s)
    }

    /// Load the waypoint file at `path`
    pub fn load<P: AsRef<Path>>(path: P, max_s: f64) -> PlannerResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), max_s)
    }

    /// Counter-clockwise circular track of `count` waypoints, d growing outwards.
    ///
    /// s follows the chord lengths so the polyline is traversed at unit rate.
    pub fn circular(radius: f64, count: usize) -> PlannerResult<Self> {
        if count < 3 || !(radius > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "circular track needs radius > 0 and at least 3 waypoints, got r={} n={}",
                radius, count
            )));
        }
        let chord = 2.0 * radius * (PI / count as f64).sin();
        let waypoints = (0..count)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / count as f64;
                Waypoint::new(
                    radius * theta.cos(),
                    radius * theta.sin(),
                    chord * i as f64,
                    theta.cos(),
                    theta.sin(),
                )
            })
            .collect();
        Self::new(waypoints, chord * count as f64)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Index of the waypoint nearest to `(x, y)`
    pub fn closest_waypoint(&self, x: f64, y: f64) -> usize {
        let p = Point2D::new(x, y);
        self.waypoints
            .iter()
            .map(|w| w.position().distance(&p))
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0)
    }

    /// Segment `i -> i + 1` (wrapping) as (start s, length in s)
    fn segment_span(&self, i: usize) -> (f64, f64) {
        let n = self.waypoints.len();
        let start = self.waypoints[i].s;
        let end = if i + 1 == n {
            self.waypoints[0].s + self.max_s
        } else {
            self.waypoints[i + 1].s
        };
        (start, end - start)
    }

    /// Segment containing `s` and the interpolation fraction along it
    fn locate(&self, s: f64) -> (usize, f64) {
        let n = self.waypoints.len();
        let s = s.rem_euclid(self.max_s);
        let idx = self.waypoints.partition_point(|w| w.s <= s);
        let i = if idx == 0 { n - 1 } else { idx - 1 };
        let (start, len) = self.segment_span(i);
        let offset = (s - start).rem_euclid(self.max_s);
        let t = if len > 0.0 { (offset / len).clamp(0.0, 1.0) } else { 0.0 };
        (i, t)
    }

    /// Position and unit normal at fraction `t` of segment `i`
    fn interpolate(&self, i: usize, t: f64) -> (Vector2<f64>, Vector2<f64>) {
        let a = &self.waypoints[i];
        let b = &self.waypoints[(i + 1) % self.waypoints.len()];
        let pos = a.position().to_vector().lerp(&b.position().to_vector(), t);
        let normal = a.normal().lerp(&b.normal(), t);
        let normal = normal.try_normalize(1e-12).unwrap_or_else(|| a.normal());
        (pos, normal)
    }

    /// Closest point of segment `i` to `p`: (fraction, squared distance)
    fn project_on_segment(&self, i: usize, p: &Vector2<f64>) -> (f64, f64) {
        let a = self.waypoints[i].position().to_vector();
        let b = self.waypoints[(i + 1) % self.waypoints.len()].position().to_vector();
        let ab = b - a;
        let len_sq = ab.norm_squared();
        let t = if len_sq > 0.0 {
            ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let proj = a + ab * t;
        (t, (p - proj).norm_squared())
    }
}

impl FrenetFrame for RoadMap {
    fn max_s(&self) -> f64 {
        self.max_s
    }

    fn to_cartesian(&self, s: f64, d: f64) -> Point2D {
        let (i, t) = self.locate(s);
        let (pos, normal) = self.interpolate(i, t);
        Point2D::from(pos + normal * d)
    }

    fn to_frenet(&self, x: f64, y: f64) -> (f64, f64) {
        let n = self.waypoints.len();
        let p = Vector2::new(x, y);
        let closest = self.closest_waypoint(x, y);

        // The nearest point lies on one of the two segments meeting at the closest waypoint
        let before = (closest + n - 1) % n;
        let (i, t, _) = [before, closest]
            .iter()
            .map(|&i| {
                let (t, dist_sq) = self.project_on_segment(i, &p);
                (i, t, dist_sq)
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .unwrap_or((closest, 0.0, 0.0));

        let (start, len) = self.segment_span(i);
        let s = (start + t * len).rem_euclid(self.max_s);
        let (pos, normal) = self.interpolate(i, t);
        let d = (p - pos).dot(&normal);
        (s, d)
    }
}
