//! Natural cubic spline interpolation.

use super::{locate, validate_knots, Extrapolation, Interpolator, Location};
use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_tridiagonal;

/// Natural cubic spline.
///
/// The knot second derivatives depend linearly on the ordinates, so the
/// spline stores one basis column per knot and reports exact sensitivities.
///
/// # Example
///
/// ```rust
/// use strata_math::interpolation::{CubicSpline, Interpolator};
///
/// let spline = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 4.0, 9.0]).unwrap();
/// let y = spline.interpolate(1.5).unwrap();
/// assert!(y > 1.0 && y < 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    y2s: Vec<f64>,
    /// `basis[j]` holds the second derivatives of the spline through the unit vector `e_j`.
    basis: Vec<Vec<f64>>,
    extrapolation: Extrapolation,
}

impl CubicSpline {
    /// Creates a natural cubic spline; needs at least three knots.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, 3)?;

        let n = xs.len();
        let mut basis = Vec::with_capacity(n);
        let mut unit = vec![0.0; n];
        for j in 0..n {
            unit[j] = 1.0;
            basis.push(second_derivatives(&xs, &unit)?);
            unit[j] = 0.0;
        }

        let y2s = (0..n)
            .map(|i| (0..n).map(|j| ys[j] * basis[j][i]).sum())
            .collect();

        Ok(Self {
            xs,
            ys,
            y2s,
            basis,
            extrapolation: Extrapolation::Flat,
        })
    }

    /// Sets the extrapolation policy.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Value and slope on segment `i` at `x`.
    fn on_segment(&self, ys: &[f64], y2s: &[f64], i: usize, x: f64) -> (f64, f64) {
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;

        let value = a * ys[i]
            + b * ys[i + 1]
            + ((a * a * a - a) * y2s[i] + (b * b * b - b) * y2s[i + 1]) * h * h / 6.0;
        let slope = (ys[i + 1] - ys[i]) / h - (3.0 * a * a - 1.0) / 6.0 * h * y2s[i]
            + (3.0 * b * b - 1.0) / 6.0 * h * y2s[i + 1];
        (value, slope)
    }

    /// Evaluates the spline defined by `(ys, y2s)` with the extrapolation policy applied.
    fn evaluate(&self, ys: &[f64], y2s: &[f64], x: f64) -> MathResult<(f64, f64)> {
        let n = self.xs.len();
        let (x_end, seg) = match locate(&self.xs, x) {
            Location::Inside(i) => return Ok(self.on_segment(ys, y2s, i, x)),
            Location::Below => (self.xs[0], 0),
            Location::Above => (self.xs[n - 1], n - 2),
        };

        match self.extrapolation {
            Extrapolation::None => Err(MathError::ExtrapolationNotAllowed {
                x,
                min: self.xs[0],
                max: self.xs[n - 1],
            }),
            Extrapolation::Flat => Ok((self.on_segment(ys, y2s, seg, x_end).0, 0.0)),
            Extrapolation::Linear => {
                let (value, slope) = self.on_segment(ys, y2s, seg, x_end);
                Ok((value + slope * (x - x_end), slope))
            }
        }
    }
}

impl Interpolator for CubicSpline {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        Ok(self.evaluate(&self.ys, &self.y2s, x)?.0)
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        Ok(self.evaluate(&self.ys, &self.y2s, x)?.1)
    }

    fn sensitivity(&self, x: f64) -> MathResult<Vec<f64>> {
        let n = self.xs.len();
        let mut unit = vec![0.0; n];
        let mut weights = Vec::with_capacity(n);
        for j in 0..n {
            unit[j] = 1.0;
            weights.push(self.evaluate(&unit, &self.basis[j], x)?.0);
            unit[j] = 0.0;
        }
        Ok(weights)
    }

    fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

/// Second derivatives of the natural spline through `(xs, ys)`.
fn second_derivatives(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let m = n - 2;

    let off: Vec<f64> = (0..m.saturating_sub(1)).map(|k| h[k + 1]).collect();
    let diag: Vec<f64> = (0..m).map(|r| 2.0 * (h[r] + h[r + 1])).collect();
    let rhs: Vec<f64> = (0..m)
        .map(|r| 6.0 * ((ys[r + 2] - ys[r + 1]) / h[r + 1] - (ys[r + 1] - ys[r]) / h[r]))
        .collect();

    let interior = solve_tridiagonal(&off, &diag, &off, &rhs)?;

    let mut y2s = vec![0.0; n];
    y2s[1..n - 1].copy_from_slice(&interior);
    Ok(y2s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reproduces_straight_line() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 3.0, 4.0], vec![1.0, 3.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(spline.interpolate(2.2).unwrap(), 5.4, epsilon = 1e-12);
        assert_relative_eq!(spline.derivative(0.7).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_natural_end_conditions() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 4.0, 9.0]).unwrap();
        assert_eq!(spline.y2s[0], 0.0);
        assert_eq!(spline.y2s[3], 0.0);
        // Unit spacing: 4 m1 + m2 = 12 and m1 + 4 m2 = 12
        assert_relative_eq!(spline.y2s[1], 2.4, epsilon = 1e-12);
        assert_relative_eq!(spline.y2s[2], 2.4, epsilon = 1e-12);
    }

    #[test]
    fn test_extrapolation() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![0.0, 1.0, 4.0, 9.0];
        let none = CubicSpline::new(xs.clone(), ys.clone())
            .unwrap()
            .with_extrapolation(Extrapolation::None);
        assert!(none.interpolate(-0.5).is_err());
        assert!(none.interpolate(3.5).is_err());

        let flat = CubicSpline::new(xs, ys).unwrap();
        assert_relative_eq!(flat.interpolate(3.5).unwrap(), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_points() {
        assert!(CubicSpline::new(vec![0.0, 1.0], vec![0.0, 1.0]).is_err());
    }
}
