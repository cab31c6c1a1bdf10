//! Nelder-Mead simplex search backed by `argmin`.

use argmin::core::{
    CostFunction, Error, Executor, State, TerminationReason, TerminationStatus,
};
use argmin::solver::neldermead::NelderMead;

use super::{OptimizationConfig, OptimizationResult};
use crate::error::{MathError, MathResult};

/// Adapts a closure to argmin's cost function interface.
struct ClosureCost<F> {
    objective: F,
}

impl<F> CostFunction for ClosureCost<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let value = (self.objective)(param);
        // The simplex ordering needs comparable costs.
        Ok(if value.is_nan() { f64::INFINITY } else { value })
    }
}

/// Minimises `objective` starting from `initial`.
///
/// The initial simplex is `initial` plus one vertex per coordinate, offset
/// by `steps[i]` along axis `i`. The search stops when the standard deviation
/// of the simplex costs drops below `config.tolerance` or after
/// `config.max_iterations` iterations.
///
/// # Example
///
/// ```rust
/// use strata_math::optimization::{nelder_mead, OptimizationConfig};
///
/// let rosen = |p: &[f64]| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2);
/// let result = nelder_mead(rosen, &[-1.0, 1.0], &[0.5, 0.5], &OptimizationConfig::default()).unwrap();
/// assert!((result.parameters[0] - 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    steps: &[f64],
    config: &OptimizationConfig,
) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return Err(MathError::invalid_input("no parameters to optimise"));
    }
    if steps.len() != initial.len() {
        return Err(MathError::dimension_mismatch(initial.len(), 1, steps.len(), 1));
    }

    let mut simplex = Vec::with_capacity(initial.len() + 1);
    simplex.push(initial.to_vec());
    for (i, step) in steps.iter().enumerate() {
        let mut vertex = initial.to_vec();
        vertex[i] += if *step == 0.0 { config.step_size } else { *step };
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(config.tolerance)
        .map_err(|e| MathError::optimization_failed(e.to_string()))?;

    let outcome = Executor::new(ClosureCost { objective }, solver)
        .configure(|state| state.max_iters(u64::from(config.max_iterations)))
        .run()
        .map_err(|e| MathError::optimization_failed(e.to_string()))?;

    let state = outcome.state();
    let parameters = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| MathError::optimization_failed("no best parameters reported"))?;
    let converged = matches!(
        state.get_termination_status(),
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
    );

    tracing::debug!(
        iterations = state.get_iter(),
        cost = state.get_best_cost(),
        converged,
        "Nelder-Mead finished"
    );

    Ok(OptimizationResult {
        parameters,
        objective_value: state.get_best_cost(),
        iterations: u32::try_from(state.get_iter()).unwrap_or(u32::MAX),
        converged,
    })
}
