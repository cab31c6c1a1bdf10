//! Staged multi-curve solver.

use tracing::info;

use super::newton::solve_partition;
use super::{CalibrationConfig, CalibrationReport, JacobianMethod, StagePartition};
use crate::error::CurveResult;
use crate::instruments::InstrumentSet;
use crate::market::CurveSet;

/// Calibrates a whole curve set, one stage at a time, in place.
///
/// # Example
///
/// ```rust
/// use strata_curves::prelude::*;
///
/// let build = Date::from_ymd(2025, 1, 15).unwrap();
/// let maturity = Date::from_ymd(2025, 4, 15).unwrap();
/// let mut curves = CurveSet::new(build)
///     .with_curve(IrCurve::new("USD", build, vec![maturity], vec![0.05]).unwrap())
///     .unwrap();
/// let instruments = InstrumentSet::new().with(Deposit::new("USD", build, maturity, 0.06));
///
/// let mut solver = MultiCurveSolver::numerical();
/// let report = solver.solve(&mut curves, &instruments).unwrap();
///
/// assert!(report.is_converged());
/// assert!(solver.used_iterations() < solver.max_iterations());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultiCurveSolver {
    config: CalibrationConfig,
    used_iterations: u32,
}

impl MultiCurveSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            used_iterations: 0,
        }
    }

    /// Solver with a bump-and-revalue Jacobian.
    #[must_use]
    pub fn numerical() -> Self {
        Self::new(CalibrationConfig::numerical())
    }

    /// Solver with an analytic Jacobian.
    #[must_use]
    pub fn analytic() -> Self {
        Self::new(CalibrationConfig::analytic())
    }

    /// Configuration.
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    /// Per-stage iteration budget.
    pub fn max_iterations(&self) -> u32 {
        self.config.max_iterations
    }

    /// Jacobian method.
    pub fn jacobian(&self) -> JacobianMethod {
        self.config.jacobian
    }

    /// Largest stage iteration count of the last solve.
    pub fn used_iterations(&self) -> u32 {
        self.used_iterations
    }

    /// Calibrates every stage.
    pub fn solve(&mut self, curves: &mut CurveSet, instruments: &InstrumentSet) -> CurveResult<CalibrationReport> {
        self.run(curves, instruments, None)
    }

    /// Calibrates stages up to and including `max_stage`; later stages are
    /// validated but left untouched.
    pub fn solve_up_to(
        &mut self,
        curves: &mut CurveSet,
        instruments: &InstrumentSet,
        max_stage: u32,
    ) -> CurveResult<CalibrationReport> {
        self.run(curves, instruments, Some(max_stage))
    }

    fn run(
        &mut self,
        curves: &mut CurveSet,
        instruments: &InstrumentSet,
        max_stage: Option<u32>,
    ) -> CurveResult<CalibrationReport> {
        self.config.validate()?;
        let mut partition = StagePartition::build(curves, instruments, self.config.jacobian)?;
        if let Some(max_stage) = max_stage {
            partition = partition.up_to(max_stage);
        }

        let report = solve_partition(curves, instruments, &partition, &self.config)?;
        self.used_iterations = report.used_iterations;
        info!(
            stages = report.stages.len(),
            status = %report.status,
            used_iterations = report.used_iterations,
            jacobian = ?self.config.jacobian,
            "calibration finished"
        );
        Ok(report)
    }
}
