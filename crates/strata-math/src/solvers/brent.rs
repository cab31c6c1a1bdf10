//! Brent's bracketing root finder.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Finds a root of `f` in `[a, b]` with Brent's method.
///
/// Requires `f(a)` and `f(b)` to have opposite signs. Each step tries inverse
/// quadratic interpolation or a secant step and falls back to bisection when
/// the trial point is not acceptable.
///
/// # Example
///
/// ```rust
/// use strata_math::solvers::{brent, SolverConfig};
///
/// let f = |x: f64| x * x * x - x - 2.0;
/// let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!(f(result.root).abs() < 1e-10);
/// ```
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));

    if fa == 0.0 {
        return Ok(SolverResult {
            root: a,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fa * fb > 0.0 || !fa.is_finite() || !fb.is_finite() {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    // `c` is the previous iterate with f(c) of opposite sign to f(b).
    let (mut c, mut fc) = (a, fa);
    let mut step = b - a;
    let mut prev_step = step;

    for iteration in 0..config.max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            step = b - a;
            prev_step = step;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let mid = 0.5 * (c - b);
        if fb.abs() < config.tolerance || mid.abs() <= tol {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }

        if prev_step.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if (a - c).abs() < f64::EPSILON {
                (2.0 * mid * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * mid * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * mid * q - (tol * q).abs()).min((prev_step * q).abs()) {
                prev_step = step;
                step = p / q;
            } else {
                step = mid;
                prev_step = step;
            }
        } else {
            step = mid;
            prev_step = step;
        }

        a = b;
        fa = fb;
        b += if step.abs() > tol { step } else { tol.copysign(mid) };
        fb = f(b);
    }

    Err(MathError::convergence_failed(config.max_iterations, fb.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let result = brent(|x| x * x - 2.0, 1.0, 2.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
        assert!(result.iterations < 20);
    }

    #[test]
    fn test_sin_near_pi() {
        let result = brent(f64::sin, 3.0, 4.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, std::f64::consts::PI, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_bracket() {
        assert!(matches!(
            brent(|x| x * x - 2.0, 2.0, 3.0, &SolverConfig::default()),
            Err(MathError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn test_root_at_endpoint() {
        let result = brent(|x| x - 1.0, 1.0, 3.0, &SolverConfig::default()).unwrap();
        assert_eq!(result.root, 1.0);
    }
}
