//! Jacobian construction.
//!
//! Entry `(p, k)` of a stage Jacobian is `∂PV(instrument k) / ∂(pillar p)`,
//! with rows in the stage's pillar order and columns in its instrument
//! order.

use nalgebra::DMatrix;

use super::stage::Stage;
use crate::curves::PillarCurve;
use crate::error::{CurveError, CurveResult};
use crate::instruments::{CalibrationInstrument, InstrumentSet};
use crate::market::CurveSet;

fn instrument(instruments: &InstrumentSet, position: usize) -> CurveResult<&dyn CalibrationInstrument> {
    instruments.get(position).ok_or_else(|| {
        CurveError::invalid_instrument(format!(
            "stage refers to instrument {position} of a set of {}",
            instruments.len()
        ))
    })
}

/// PVs of the stage's instruments in stage order.
pub fn stage_pvs(curves: &CurveSet, instruments: &InstrumentSet, stage: &Stage) -> CurveResult<Vec<f64>> {
    stage
        .instruments()
        .iter()
        .map(|&position| instrument(instruments, position)?.pv(curves))
        .collect()
}

/// Bump-and-revalue Jacobian.
///
/// Each pillar is bumped by `bump`, every stage instrument repriced, and the
/// pillar restored to its exact previous value. `base_pvs` are the PVs at
/// the unbumped state.
#[cfg(not(feature = "parallel"))]
pub fn numerical_jacobian(
    curves: &mut CurveSet,
    instruments: &InstrumentSet,
    stage: &Stage,
    base_pvs: &[f64],
    bump: f64,
) -> CurveResult<DMatrix<f64>> {
    let n = stage.size();
    let mut jacobian = DMatrix::zeros(n, n);
    for (p, pillar) in stage.pillars().iter().enumerate() {
        let original = curves.curve(&pillar.curve)?.rate(pillar.pillar)?;
        curves.curve_mut(&pillar.curve)?.bump_rate(pillar.pillar, bump)?;
        let bumped = stage_pvs(curves, instruments, stage);
        curves.curve_mut(&pillar.curve)?.set_rate(pillar.pillar, original)?;
        for (k, pv) in bumped?.into_iter().enumerate() {
            jacobian[(p, k)] = (pv - base_pvs[k]) / bump;
        }
    }
    Ok(jacobian)
}

/// Bump-and-revalue Jacobian.
///
/// Each pillar is bumped on its own copy of the curve set and the copies are
/// repriced in parallel; `curves` itself is left untouched.
#[cfg(feature = "parallel")]
pub fn numerical_jacobian(
    curves: &mut CurveSet,
    instruments: &InstrumentSet,
    stage: &Stage,
    base_pvs: &[f64],
    bump: f64,
) -> CurveResult<DMatrix<f64>> {
    use rayon::prelude::*;

    let base: &CurveSet = curves;
    let columns: Vec<Vec<f64>> = stage
        .pillars()
        .par_iter()
        .map(|pillar| {
            let mut bumped = base.clone();
            bumped.curve_mut(&pillar.curve)?.bump_rate(pillar.pillar, bump)?;
            stage_pvs(&bumped, instruments, stage)
        })
        .collect::<CurveResult<_>>()?;

    let n = stage.size();
    let mut jacobian = DMatrix::zeros(n, n);
    for (p, column) in columns.into_iter().enumerate() {
        for (k, pv) in column.into_iter().enumerate() {
            jacobian[(p, k)] = (pv - base_pvs[k]) / bump;
        }
    }
    Ok(jacobian)
}

/// Jacobian from instrument sensitivities.
///
/// Each instrument's `∂PV/∂value(curve, date)` is spread onto the curve's
/// pillars with the weights from [`PillarCurve::sensitivity`]. Entries on
/// curves outside the stage are ignored: those curves are fixed here.
pub fn analytic_jacobian(curves: &CurveSet, instruments: &InstrumentSet, stage: &Stage) -> CurveResult<DMatrix<f64>> {
    let n = stage.size();
    let mut jacobian = DMatrix::zeros(n, n);
    for (k, &position) in stage.instruments().iter().enumerate() {
        let sensitivities = instrument(instruments, position)?.sensitivities(curves)?;
        for (name, entries) in sensitivities.iter() {
            let Some(offset) = stage.offset(name) else {
                continue;
            };
            let curve = curves.curve(name)?;
            for (date, value) in entries {
                for (p, weight) in curve.sensitivity(*date)?.into_iter().enumerate() {
                    jacobian[(offset + p, k)] += value * weight;
                }
            }
        }
    }
    Ok(jacobian)
}
