//! Common traits defining the seams between planner components

use crate::common::error::PlannerResult;
use crate::common::types::*;

/// Smooth interpolant over control points, evaluable at arbitrary x
pub trait Interpolant: Sized {
    /// Fit through `(x[i], y[i])`; `x` must be strictly increasing.
    fn fit(x: &[f64], y: &[f64]) -> PlannerResult<Self>;

    /// Evaluate the curve at `x`
    fn eval(&self, x: f64) -> f64;
}

/// Closed-loop reference path with Frenet <-> Cartesian conversion
pub trait FrenetFrame {
    /// Track length after which s wraps back to 0
    fn max_s(&self) -> f64;

    /// World position of Frenet coordinate `(s, d)`; `s` is taken modulo `max_s`.
    fn to_cartesian(&self, s: f64, d: f64) -> Point2D;

    /// Frenet `(s, d)` of world position `(x, y)`
    fn to_frenet(&self, x: f64, y: f64) -> (f64, f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that traits compile correctly
    struct Line {
        slope: f64,
    }

    impl Interpolant for Line {
        fn fit(x: &[f64], y: &[f64]) -> PlannerResult<Self> {
            Ok(Line { slope: (y[1] - y[0]) / (x[1] - x[0]) })
        }

        fn eval(&self, x: f64) -> f64 {
            self.slope * x
        }
    }

    #[test]
    fn test_interpolant_trait() {
        let line = Line::fit(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
        assert!((line.eval(3.0) - 6.0).abs() < 1e-10);
    }
}
