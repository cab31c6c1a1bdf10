//! Gauss-Newton nonlinear least squares.

use nalgebra::{DMatrix, DVector};

use super::{OptimizationConfig, OptimizationResult};
use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_linear_system;

fn sum_of_squares(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

/// Minimises `sum(residuals(p)^2)` by Gauss-Newton.
///
/// The Jacobian is a forward finite difference with step
/// `config.step_size`. Steps that do not reduce the objective are halved;
/// if the normal equations are singular a small diagonal damping is added.
pub fn gauss_newton<F>(
    residuals: F,
    initial: &[f64],
    config: &OptimizationConfig,
) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::invalid_input("no parameters to optimise"));
    }

    let mut params = initial.to_vec();
    let mut r = residuals(&params);
    let m = r.len();
    if m < n {
        return Err(MathError::insufficient_data(n, m));
    }
    let mut objective = sum_of_squares(&r);
    if !objective.is_finite() {
        return Err(MathError::invalid_input("residuals are not finite at the initial point"));
    }

    for iteration in 0..config.max_iterations {
        if objective < config.tolerance * config.tolerance {
            return Ok(OptimizationResult {
                parameters: params,
                objective_value: objective,
                iterations: iteration,
                converged: true,
            });
        }

        let mut jacobian = DMatrix::zeros(m, n);
        for j in 0..n {
            let h = config.step_size * params[j].abs().max(1.0);
            let mut bumped = params.clone();
            bumped[j] += h;
            let rb = residuals(&bumped);
            if rb.len() != m {
                return Err(MathError::dimension_mismatch(m, 1, rb.len(), 1));
            }
            for i in 0..m {
                jacobian[(i, j)] = (rb[i] - r[i]) / h;
            }
        }

        let jt = jacobian.transpose();
        let normal = &jt * &jacobian;
        let gradient = -(&jt * DVector::from_column_slice(&r));

        let delta = match solve_linear_system(&normal, &gradient) {
            Ok(delta) => delta,
            Err(MathError::SingularMatrix) => {
                let damping = 1e-10 * normal.trace().abs().max(1e-12);
                let damped = &normal + DMatrix::identity(n, n) * damping;
                solve_linear_system(&damped, &gradient)?
            }
            Err(e) => return Err(e),
        };

        let mut scale = 1.0;
        let mut improved = false;
        while scale > 1e-10 {
            let trial: Vec<f64> = params
                .iter()
                .zip(delta.iter())
                .map(|(p, d)| p + scale * d)
                .collect();
            let r_trial = residuals(&trial);
            let obj_trial = sum_of_squares(&r_trial);
            if obj_trial.is_finite() && obj_trial < objective {
                params = trial;
                r = r_trial;
                let gain = objective - obj_trial;
                objective = obj_trial;
                improved = true;
                if gain < config.tolerance * objective.max(config.tolerance) {
                    return Ok(OptimizationResult {
                        parameters: params,
                        objective_value: objective,
                        iterations: iteration + 1,
                        converged: true,
                    });
                }
                break;
            }
            scale *= 0.5;
        }

        if !improved {
            // No descent along the Gauss-Newton direction: stationary point.
            return Ok(OptimizationResult {
                parameters: params,
                objective_value: objective,
                iterations: iteration,
                converged: delta.amax() < config.tolerance.sqrt(),
            });
        }
    }

    Ok(OptimizationResult {
        parameters: params,
        objective_value: objective,
        iterations: config.max_iterations,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_fit() {
        // y = a * exp(b x) sampled exactly
        let xs: [f64; 5] = [0.0, 0.5, 1.0, 1.5, 2.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * (0.3 * x).exp()).collect();
        let residuals = |p: &[f64]| {
            xs.iter()
                .zip(ys.iter())
                .map(|(x, y)| p[0] * (p[1] * x).exp() - y)
                .collect::<Vec<f64>>()
        };
        let result = gauss_newton(residuals, &[1.0, 0.0], &OptimizationConfig::default()).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.parameters[1], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_underdetermined_rejected() {
        let residuals = |p: &[f64]| vec![p[0] + p[1]];
        assert!(gauss_newton(residuals, &[0.0, 0.0], &OptimizationConfig::default()).is_err());
    }
}
