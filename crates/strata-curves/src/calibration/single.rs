//! Single-curve solver.
//!
//! Calibrates one curve against its own instruments, holding every other
//! curve of a context set fixed: price curves from forwards and average
//! price swaps, basis curves over a solved base, hazard curves from CDS.

use tracing::info;

use super::newton::solve_partition;
use super::{CalibrationConfig, CalibrationReport, StagePartition};
use crate::curves::{BasisPriceCurve, HazardCurve, IrCurve, MarketCurve, PillarCurve, PriceCurve};
use crate::error::{CurveError, CurveResult};
use crate::instruments::InstrumentSet;
use crate::market::CurveSet;

/// A calibrated curve with its convergence report.
#[derive(Debug, Clone)]
pub struct SolvedCurve<C = MarketCurve> {
    /// The calibrated curve.
    pub curve: C,
    /// Convergence report.
    pub report: CalibrationReport,
}

impl SolvedCurve {
    fn try_map<C>(self, f: impl FnOnce(MarketCurve) -> CurveResult<C>) -> CurveResult<SolvedCurve<C>> {
        Ok(SolvedCurve {
            curve: f(self.curve)?,
            report: self.report,
        })
    }
}

/// Solves one curve and returns it, leaving the context untouched.
#[derive(Debug, Clone, Default)]
pub struct SingleCurveSolver {
    config: CalibrationConfig,
    used_iterations: u32,
}

impl SingleCurveSolver {
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

    /// Iteration budget.
    pub fn max_iterations(&self) -> u32 {
        self.config.max_iterations
    }

    /// Iterations used by the last solve.
    pub fn used_iterations(&self) -> u32 {
        self.used_iterations
    }

    /// Calibrates `curve` against `instruments`.
    ///
    /// Every instrument must target `curve`. The instruments may read any
    /// curve of `context`, all of which are held fixed; a context curve with
    /// the same name as `curve` is shadowed.
    pub fn solve(
        &mut self,
        curve: impl Into<MarketCurve>,
        context: &CurveSet,
        instruments: &InstrumentSet,
    ) -> CurveResult<SolvedCurve> {
        self.config.validate()?;
        let curve = curve.into();
        let name = curve.name().to_string();

        if instruments.is_empty() {
            return Err(CurveError::stage_mismatch(curve.solve_stage(), curve.number_of_pillars(), 0));
        }
        if let Some(other) = instruments.iter().find(|i| i.solve_curve() != name) {
            return Err(CurveError::invalid_instrument(format!(
                "'{}' targets curve '{}' while solving '{name}'",
                other.description(),
                other.solve_curve()
            )));
        }

        let mut work = context.clone();
        work.fix_all();
        work.replace(curve)?;
        work.unfix(&name);
        let partition = StagePartition::build(&work, instruments, self.config.jacobian)?;
        let report = solve_partition(&mut work, instruments, &partition, &self.config)?;
        self.used_iterations = report.used_iterations;

        info!(
            curve = %name,
            status = %report.status,
            iterations = report.used_iterations,
            "single curve solve finished"
        );

        let curve = work.remove(&name).ok_or_else(|| CurveError::curve_not_found(&name))?;
        Ok(SolvedCurve { curve, report })
    }

    /// Calibrates an interest-rate curve.
    pub fn solve_ir_curve(
        &mut self,
        curve: IrCurve,
        context: &CurveSet,
        instruments: &InstrumentSet,
    ) -> CurveResult<SolvedCurve<IrCurve>> {
        self.solve(curve, context, instruments)?.try_map(MarketCurve::into_ir)
    }

    /// Calibrates a price curve.
    pub fn solve_price_curve(
        &mut self,
        curve: PriceCurve,
        context: &CurveSet,
        instruments: &InstrumentSet,
    ) -> CurveResult<SolvedCurve<PriceCurve>> {
        self.solve(curve, context, instruments)?.try_map(MarketCurve::into_price)
    }

    /// Calibrates a basis curve; its base must be in `context`.
    pub fn solve_basis_curve(
        &mut self,
        curve: BasisPriceCurve,
        context: &CurveSet,
        instruments: &InstrumentSet,
    ) -> CurveResult<SolvedCurve<BasisPriceCurve>> {
        if !context.contains(curve.base_curve()) {
            return Err(CurveError::curve_not_found(curve.base_curve()));
        }
        self.solve(curve, context, instruments)?.try_map(MarketCurve::into_basis)
    }

    /// Calibrates a hazard curve.
    pub fn solve_hazard_curve(
        &mut self,
        curve: HazardCurve,
        context: &CurveSet,
        instruments: &InstrumentSet,
    ) -> CurveResult<SolvedCurve<HazardCurve>> {
        self.solve(curve, context, instruments)?.try_map(MarketCurve::into_hazard)
    }
}
