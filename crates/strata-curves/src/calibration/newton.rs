//! The Newton-Raphson loop shared by every solver.

use nalgebra::{DMatrix, DVector};
use strata_math::linear_algebra::solve_linear_system;
use strata_math::MathError;
use tracing::{debug, info, warn};

use super::jacobian::{analytic_jacobian, numerical_jacobian, stage_pvs};
use super::stage::{Stage, StagePartition};
use super::{CalibrationConfig, CalibrationReport, JacobianMethod, SolveStatus, StageReport};
use crate::curves::PillarCurve;
use crate::error::CurveResult;
use crate::instruments::InstrumentSet;
use crate::market::CurveSet;

/// Solves every stage of `partition` in order.
///
/// A stage that stops early does not stop the run: later stages solve
/// against whatever the earlier stage left behind.
pub(crate) fn solve_partition(
    curves: &mut CurveSet,
    instruments: &InstrumentSet,
    partition: &StagePartition,
    config: &CalibrationConfig,
) -> CurveResult<CalibrationReport> {
    let mut reports = Vec::with_capacity(partition.len());
    for stage in partition.stages() {
        reports.push(solve_stage(curves, instruments, stage, config)?);
    }
    Ok(CalibrationReport::new(reports, config.tolerance, config.max_iterations))
}

fn read_guess(curves: &CurveSet, stage: &Stage) -> CurveResult<Vec<f64>> {
    stage
        .pillars()
        .iter()
        .map(|p| curves.curve(&p.curve)?.rate(p.pillar))
        .collect()
}

fn write_guess(curves: &mut CurveSet, stage: &Stage, guess: &[f64]) -> CurveResult<()> {
    for (pillar, value) in stage.pillars().iter().zip(guess) {
        curves.curve_mut(&pillar.curve)?.set_rate(pillar.pillar, *value)?;
    }
    Ok(())
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Runs Newton on one stage until max |PV| < tolerance, the budget runs
/// out, or the step cannot be computed.
///
/// Each step solves `Jᵀ Δ = PV` by LU and moves the pillars to
/// `guess - Δ`. On a singular system or a non-finite PV or step the pillars
/// keep their last finite values.
pub(crate) fn solve_stage(
    curves: &mut CurveSet,
    instruments: &InstrumentSet,
    stage: &Stage,
    config: &CalibrationConfig,
) -> CurveResult<StageReport> {
    let mut iterations = 0;
    let mut last_finite: Option<Vec<f64>> = None;

    let (status, max_abs_pv) = loop {
        let pvs = stage_pvs(curves, instruments, stage)?;
        let residual = max_abs(&pvs);

        if !pvs.iter().all(|v| v.is_finite()) {
            if let Some(guess) = &last_finite {
                write_guess(curves, stage, guess)?;
            }
            warn!(stage = stage.index(), iteration = iterations, "non-finite PV, stopping stage");
            let residual = max_abs(&stage_pvs(curves, instruments, stage)?);
            break (SolveStatus::Singular, residual);
        }

        debug!(stage = stage.index(), iteration = iterations, max_abs_pv = residual, "newton iteration");

        if residual < config.tolerance {
            break (SolveStatus::Converged, residual);
        }
        if iterations >= config.max_iterations {
            break (SolveStatus::IterationsExhausted, residual);
        }

        let jacobian = match config.jacobian {
            JacobianMethod::Numerical => numerical_jacobian(curves, instruments, stage, &pvs, config.bump)?,
            JacobianMethod::Analytic => analytic_jacobian(curves, instruments, stage)?,
        };

        let Some(step) = newton_step(&jacobian, pvs)? else {
            warn!(stage = stage.index(), iteration = iterations, "singular jacobian, stopping stage");
            break (SolveStatus::Singular, residual);
        };

        let guess = read_guess(curves, stage)?;
        let next: Vec<f64> = guess.iter().zip(step.iter()).map(|(g, d)| g - d).collect();
        if !next.iter().all(|v| v.is_finite()) {
            warn!(stage = stage.index(), iteration = iterations, "non-finite newton step, stopping stage");
            break (SolveStatus::Singular, residual);
        }

        write_guess(curves, stage, &next)?;
        last_finite = Some(guess);
        iterations += 1;
    };

    match status {
        SolveStatus::Converged => info!(
            stage = stage.index(),
            curves = ?stage.curves(),
            iterations,
            max_abs_pv,
            "stage converged"
        ),
        SolveStatus::IterationsExhausted => warn!(
            stage = stage.index(),
            curves = ?stage.curves(),
            iterations,
            max_abs_pv,
            "stage did not converge within the iteration budget"
        ),
        SolveStatus::Singular => {}
    }

    Ok(StageReport {
        stage: stage.index(),
        curves: stage.curves().to_vec(),
        iterations,
        max_abs_pv,
        status,
    })
}

/// Solves `Jᵀ Δ = PV`; `None` when the system is singular.
fn newton_step(jacobian: &DMatrix<f64>, pvs: Vec<f64>) -> CurveResult<Option<DVector<f64>>> {
    if !jacobian.iter().all(|v| v.is_finite()) {
        return Ok(None);
    }
    match solve_linear_system(&jacobian.transpose(), &DVector::from_vec(pvs)) {
        Ok(step) => Ok(Some(step)),
        Err(MathError::SingularMatrix) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
