//! Standard normal distribution helpers.

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal density.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Inverse of the standard normal CDF.
///
/// Returns `-inf`/`+inf` at 0 and 1 and `NaN` outside `[0, 1]`.
#[must_use]
pub fn norm_inv_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cdf_known_values() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(1.959_963_984_540_054), 0.975, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(-1.0), 0.158_655_253_931_457_05, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        for p in [0.01, 0.25, 0.5, 0.75, 0.99] {
            assert_relative_eq!(norm_cdf(norm_inv_cdf(p)), p, epsilon = 1e-12);
        }
        assert!(norm_inv_cdf(1.5).is_nan());
        assert_eq!(norm_inv_cdf(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_pdf_peak() {
        assert_relative_eq!(norm_pdf(0.0), INV_SQRT_2PI, epsilon = 1e-15);
        assert_relative_eq!(norm_pdf(1.0), norm_pdf(-1.0), epsilon = 1e-15);
    }
}
