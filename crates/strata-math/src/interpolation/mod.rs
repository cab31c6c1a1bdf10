//! Interpolation with pillar sensitivities.
//!
//! Calibrated curves are interpolated through their pillars. Besides value and
//! slope, every interpolator reports how the interpolated value moves with
//! each knot ordinate ([`Interpolator::sensitivity`]); analytic Jacobians
//! project instrument risk onto pillars through these weights.
//!
//! # Available Methods
//!
//! - [`LinearInterpolator`]: piecewise linear; sensitivities are hat functions
//! - [`LogLinearInterpolator`]: linear in `ln(y)`, for positive quantities
//! - [`CubicSpline`]: natural cubic spline
//!
//! [`InterpolatorKind`] selects a method at runtime and degrades gracefully
//! when there are too few knots (one knot is flat, a spline needs three).

mod cubic_spline;
mod linear;
mod log_linear;

pub use cubic_spline::CubicSpline;
pub use linear::LinearInterpolator;
pub use log_linear::LogLinearInterpolator;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MathError, MathResult};

/// Behaviour outside the knot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Extrapolation {
    /// Queries outside the range are errors.
    None,
    /// Hold the end value.
    #[default]
    Flat,
    /// Extend the end slope.
    Linear,
}

/// Trait for interpolation methods.
pub trait Interpolator: Send + Sync + fmt::Debug {
    /// Interpolated value at `x`.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// First derivative at `x`.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Partial derivatives of the value at `x` with respect to each knot ordinate.
    fn sensitivity(&self, x: f64) -> MathResult<Vec<f64>>;

    /// Extrapolation policy.
    fn extrapolation(&self) -> Extrapolation;

    /// Smallest knot abscissa.
    fn min_x(&self) -> f64;

    /// Largest knot abscissa.
    fn max_x(&self) -> f64;

    /// Whether `x` lies within the knot range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}

/// Runtime selection of an interpolation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InterpolatorKind {
    /// Piecewise linear.
    #[default]
    Linear,
    /// Linear in the logarithm of the ordinates.
    LogLinear,
    /// Natural cubic spline.
    CubicSpline,
}

impl InterpolatorKind {
    /// Builds an interpolator of this kind through the given knots.
    ///
    /// A spline with fewer than three knots falls back to linear.
    pub fn build(
        self,
        xs: Vec<f64>,
        ys: Vec<f64>,
        extrapolation: Extrapolation,
    ) -> MathResult<Box<dyn Interpolator>> {
        Ok(match self {
            InterpolatorKind::Linear => {
                Box::new(LinearInterpolator::new(xs, ys)?.with_extrapolation(extrapolation))
            }
            InterpolatorKind::LogLinear => {
                Box::new(LogLinearInterpolator::new(xs, ys)?.with_extrapolation(extrapolation))
            }
            InterpolatorKind::CubicSpline if xs.len() < 3 => {
                Box::new(LinearInterpolator::new(xs, ys)?.with_extrapolation(extrapolation))
            }
            InterpolatorKind::CubicSpline => {
                Box::new(CubicSpline::new(xs, ys)?.with_extrapolation(extrapolation))
            }
        })
    }
}

impl fmt::Display for InterpolatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolatorKind::Linear => "Linear",
            InterpolatorKind::LogLinear => "Log-Linear",
            InterpolatorKind::CubicSpline => "Cubic Spline",
        };
        write!(f, "{name}")
    }
}

/// Checks knot vectors: equal lengths, at least `min_points`, finite and
/// strictly increasing abscissae.
pub(crate) fn validate_knots(xs: &[f64], ys: &[f64], min_points: usize) -> MathResult<()> {
    if xs.len() < min_points {
        return Err(MathError::insufficient_data(min_points, xs.len()));
    }
    if xs.len() != ys.len() {
        return Err(MathError::invalid_input(format!(
            "xs and ys must have same length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("knots must be finite"));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::invalid_input(
            "x values must be strictly increasing",
        ));
    }
    Ok(())
}

/// Where a query point falls relative to the knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Below,
    /// Inside segment `[xs[i], xs[i + 1]]`.
    Inside(usize),
    Above,
}

/// Locates `x`; requires at least two knots.
pub(crate) fn locate(xs: &[f64], x: f64) -> Location {
    let n = xs.len();
    if x < xs[0] {
        return Location::Below;
    }
    if x > xs[n - 1] {
        return Location::Above;
    }
    let i = match xs.binary_search_by(|probe| probe.total_cmp(&x)) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    Location::Inside(i.min(n - 2))
}

/// Linear weights of a query point on its segment.
///
/// The value is `(1 - t) * y[lo] + t * y[hi]`; `flat` marks a held end value
/// whose slope is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Stencil {
    pub lo: usize,
    pub hi: usize,
    pub t: f64,
    pub flat: bool,
}

pub(crate) fn linear_stencil(xs: &[f64], x: f64, extrapolation: Extrapolation) -> MathResult<Stencil> {
    let n = xs.len();
    if n == 1 {
        return Ok(Stencil {
            lo: 0,
            hi: 0,
            t: 0.0,
            flat: true,
        });
    }

    let out_of_range = || MathError::ExtrapolationNotAllowed {
        x,
        min: xs[0],
        max: xs[n - 1],
    };
    let on_segment = |i: usize| Stencil {
        lo: i,
        hi: i + 1,
        t: (x - xs[i]) / (xs[i + 1] - xs[i]),
        flat: false,
    };

    match (locate(xs, x), extrapolation) {
        (Location::Inside(i), _) => Ok(on_segment(i)),
        (Location::Below | Location::Above, Extrapolation::None) => Err(out_of_range()),
        (Location::Below, Extrapolation::Flat) => Ok(Stencil {
            lo: 0,
            hi: 1,
            t: 0.0,
            flat: true,
        }),
        (Location::Above, Extrapolation::Flat) => Ok(Stencil {
            lo: n - 2,
            hi: n - 1,
            t: 1.0,
            flat: true,
        }),
        (Location::Below, Extrapolation::Linear) => Ok(on_segment(0)),
        (Location::Above, Extrapolation::Linear) => Ok(on_segment(n - 2)),
    }
}
