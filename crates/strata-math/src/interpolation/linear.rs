//! Piecewise linear interpolation.

use super::{linear_stencil, validate_knots, Extrapolation, Interpolator};
use crate::error::MathResult;

/// Piecewise linear interpolation.
///
/// The sensitivity of an interpolated value to the knots is the pair of
/// hat-function weights of the enclosing segment.
///
/// # Example
///
/// ```rust
/// use strata_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 30.0]).unwrap();
/// assert_eq!(interp.interpolate(1.5).unwrap(), 20.0);
/// assert_eq!(interp.sensitivity(1.5).unwrap(), vec![0.0, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    extrapolation: Extrapolation,
}

impl LinearInterpolator {
    /// Creates a linear interpolator. A single knot yields a constant.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, 1)?;
        Ok(Self {
            xs,
            ys,
            extrapolation: Extrapolation::Flat,
        })
    }

    /// Sets the extrapolation policy.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        Ok((1.0 - s.t) * self.ys[s.lo] + s.t * self.ys[s.hi])
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        if s.flat {
            return Ok(0.0);
        }
        Ok((self.ys[s.hi] - self.ys[s.lo]) / (self.xs[s.hi] - self.xs[s.lo]))
    }

    fn sensitivity(&self, x: f64) -> MathResult<Vec<f64>> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        let mut weights = vec![0.0; self.xs.len()];
        weights[s.lo] += 1.0 - s.t;
        weights[s.hi] += s.t;
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_knot_is_flat() {
        let interp = LinearInterpolator::new(vec![0.25], vec![0.06]).unwrap();
        assert_relative_eq!(interp.interpolate(0.0).unwrap(), 0.06);
        assert_relative_eq!(interp.interpolate(5.0).unwrap(), 0.06);
        assert_relative_eq!(interp.derivative(1.0).unwrap(), 0.0);
        assert_eq!(interp.sensitivity(3.0).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_extrapolation_modes() {
        let xs = vec![1.0, 2.0];
        let ys = vec![1.0, 3.0];
        let none = LinearInterpolator::new(xs.clone(), ys.clone())
            .unwrap()
            .with_extrapolation(Extrapolation::None);
        assert!(none.interpolate(0.5).is_err());

        let flat = LinearInterpolator::new(xs.clone(), ys.clone()).unwrap();
        assert_relative_eq!(flat.interpolate(0.5).unwrap(), 1.0);
        assert_relative_eq!(flat.interpolate(3.0).unwrap(), 3.0);
        assert_relative_eq!(flat.derivative(3.0).unwrap(), 0.0);

        let linear = LinearInterpolator::new(xs, ys)
            .unwrap()
            .with_extrapolation(Extrapolation::Linear);
        assert_relative_eq!(linear.interpolate(3.0).unwrap(), 5.0);
        assert_relative_eq!(linear.derivative(0.0).unwrap(), 2.0);
        assert_eq!(linear.sensitivity(3.0).unwrap(), vec![-1.0, 2.0]);
    }
}
