//! Log-linear interpolation for strictly positive ordinates.

use super::{linear_stencil, validate_knots, Extrapolation, Interpolator};
use crate::error::{MathError, MathResult};

/// Linear interpolation of `ln(y)`.
///
/// Suited to discount factors and survival probabilities, where it
/// produces piecewise-constant forward rates.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    log_ys: Vec<f64>,
    extrapolation: Extrapolation,
}

impl LogLinearInterpolator {
    /// Creates a log-linear interpolator; every ordinate must be positive.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, 1)?;
        if ys.iter().any(|y| *y <= 0.0) {
            return Err(MathError::invalid_input(
                "log-linear interpolation requires positive values",
            ));
        }
        let log_ys = ys.iter().map(|y| y.ln()).collect();
        Ok(Self {
            xs,
            ys,
            log_ys,
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

impl Interpolator for LogLinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        Ok(((1.0 - s.t) * self.log_ys[s.lo] + s.t * self.log_ys[s.hi]).exp())
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        if s.flat {
            return Ok(0.0);
        }
        let slope = (self.log_ys[s.hi] - self.log_ys[s.lo]) / (self.xs[s.hi] - self.xs[s.lo]);
        Ok(self.interpolate(x)? * slope)
    }

    fn sensitivity(&self, x: f64) -> MathResult<Vec<f64>> {
        let s = linear_stencil(&self.xs, x, self.extrapolation)?;
        let value = ((1.0 - s.t) * self.log_ys[s.lo] + s.t * self.log_ys[s.hi]).exp();
        let mut weights = vec![0.0; self.xs.len()];
        weights[s.lo] += value * (1.0 - s.t) / self.ys[s.lo];
        weights[s.hi] += value * s.t / self.ys[s.hi];
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
