// Natural cubic spline y(x) through a handful of control points
//
// Coefficients per segment i (x in [x_i, x_{i+1}]):
//   y = a_i + b_i dx + c_i dx^2 + d_i dx^3,  dx = x - x_i
// c is solved from the tridiagonal continuity system with natural end
// conditions (zero curvature at both ends). Outside the knots the curve is
// continued as a straight line with the end slope.

extern crate nalgebra as na;

use crate::common::{Interpolant, PlannerError, PlannerResult};

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> PlannerResult<CubicSpline> {
        let nx = x.len();
        if nx != y.len() {
            return Err(PlannerError::NumericalError(format!(
                "spline needs as many x as y values ({} vs {})",
                nx,
                y.len()
            )));
        }
        if nx < 2 {
            return Err(PlannerError::NumericalError(format!(
                "spline needs at least 2 control points, got {}",
                nx
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(PlannerError::NumericalError("spline control points must be finite".to_string()));
        }
        if let Some(w) = x.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PlannerError::NumericalError(format!(
                "spline x must be strictly increasing, found {} then {}",
                w[0], w[1]
            )));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();
        let a_mat = CubicSpline::calc_a(&h);
        let b_vec = CubicSpline::calc_b(&h, &a);

        let c_na = a_mat
            .lu()
            .solve(&b_vec)
            .ok_or_else(|| PlannerError::NumericalError("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().cloned().collect();

        let mut b: Vec<f64> = Vec::with_capacity(nx - 1);
        let mut d: Vec<f64> = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(CubicSpline { x: x.to_vec(), a, b, c, d })
    }

    /// Value at `t`
    pub fn calc(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t < self.x[0] {
            return self.a[0] + self.b[0] * (t - self.x[0]);
        }
        if t > self.x[n - 1] {
            return self.a[n - 1] + self.end_slope() * (t - self.x[n - 1]);
        }
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// First derivative at `t`
    pub fn calcd(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t < self.x[0] {
            return self.b[0];
        }
        if t > self.x[n - 1] {
            return self.end_slope();
        }
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    /// Second derivative at `t`
    pub fn calcdd(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t < self.x[0] || t > self.x[n - 1] {
            return 0.0;
        }
        let i = self.search_index(t);
        let dx = t - self.x[i];
        2.0 * self.c[i] + 6.0 * self.d[i] * dx
    }

    fn end_slope(&self) -> f64 {
        let i = self.b.len() - 1;
        let h = self.x[i + 1] - self.x[i];
        self.b[i] + 2.0 * self.c[i] * h + 3.0 * self.d[i] * h.powi(2)
    }

    /// Segment index for `t` inside the knot range
    fn search_index(&self, t: f64) -> usize {
        let idx = self.x.partition_point(|&xi| xi <= t);
        idx.saturating_sub(1).min(self.x.len() - 2)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx.saturating_sub(2) {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

impl Interpolant for CubicSpline {
    fn fit(x: &[f64], y: &[f64]) -> PlannerResult<Self> {
        CubicSpline::new(x, y)
    }

    fn eval(&self, x: f64) -> f64 {
        self.calc(x)
    }
}
