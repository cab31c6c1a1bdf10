//! Repricing checks for calibrated curve sets.
//!
//! A calibrated set must reprice every instrument it was built from. The
//! solver stops on max |PV| below its tolerance; these checks apply a
//! per-instrument-type tolerance afterwards and keep the detail for audit.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata_curves::prelude::*;
//!
//! let report = MultiCurveSolver::analytic().solve(&mut curves, &instruments)?;
//! let repricing = reprice(&curves, &instruments, None)?;
//! if !repricing.is_valid() {
//!     tracing::warn!(failed = ?repricing.failed_instruments(), "repricing failed");
//! }
//! ```

use std::fmt;

use crate::error::CurveResult;
use crate::instruments::{CalibrationInstrument, InstrumentSet};
use crate::market::CurveSet;

pub use crate::instruments::InstrumentType;

/// Repricing tolerances by instrument type, in absolute PV per unit notional.
///
/// | Instrument Type     | Tolerance |
/// |---------------------|-----------|
/// | Deposits, FRAs      | 1e-9      |
/// | Swaps, basis swaps  | 1e-8      |
/// | CDS                 | 1e-8      |
/// | Forwards, APS       | 1e-8      |
pub mod tolerances {
    /// Deposit tolerance.
    pub const DEPOSIT: f64 = 1e-9;

    /// FRA tolerance.
    pub const FRA: f64 = 1e-9;

    /// Swap tolerance; multi-period legs accumulate rounding.
    pub const SWAP: f64 = 1e-8;

    /// Basis swap tolerance.
    pub const BASIS_SWAP: f64 = 1e-8;

    /// CDS tolerance.
    pub const CDS: f64 = 1e-8;

    /// Asset forward tolerance, in price units.
    pub const ASSET_FORWARD: f64 = 1e-8;

    /// Average price swap tolerance, in price units.
    pub const AVERAGE_PRICE_SWAP: f64 = 1e-8;

    /// Strict tolerance.
    pub const STRICT: f64 = 1e-9;

    /// Relaxed tolerance for coarse test configurations.
    pub const RELAXED: f64 = 1e-6;

    /// Tolerance for an instrument type.
    #[must_use]
    pub fn for_instrument(inst_type: super::InstrumentType) -> f64 {
        use super::InstrumentType;
        match inst_type {
            InstrumentType::Deposit => DEPOSIT,
            InstrumentType::Fra => FRA,
            InstrumentType::Swap => SWAP,
            InstrumentType::BasisSwap => BASIS_SWAP,
            InstrumentType::Cds => CDS,
            InstrumentType::AssetForward => ASSET_FORWARD,
            InstrumentType::AveragePriceSwap => AVERAGE_PRICE_SWAP,
        }
    }
}

/// Result of repricing one instrument.
#[derive(Debug, Clone)]
pub struct RepricingCheck {
    /// Instrument description.
    pub instrument_id: String,

    /// Type of instrument.
    pub instrument_type: InstrumentType,

    /// Target PV, zero for par instruments.
    pub target_pv: f64,

    /// PV on the calibrated curves.
    pub model_pv: f64,

    /// |model_pv - target_pv|
    pub error: f64,

    /// Tolerance applied.
    pub tolerance: f64,

    /// Whether the check passed.
    pub passed: bool,
}

impl RepricingCheck {
    /// Creates a check result.
    #[must_use]
    pub fn new(
        instrument_id: String,
        instrument_type: InstrumentType,
        target_pv: f64,
        model_pv: f64,
        tolerance: f64,
    ) -> Self {
        let error = (model_pv - target_pv).abs();
        // NaN errors fail
        let passed = error <= tolerance;

        Self {
            instrument_id,
            instrument_type,
            target_pv,
            model_pv,
            error,
            tolerance,
            passed,
        }
    }

    /// Reprices an instrument with its type's default tolerance.
    pub fn from_instrument(
        instrument: &dyn CalibrationInstrument,
        curves: &CurveSet,
        target_pv: f64,
    ) -> CurveResult<Self> {
        let tolerance = tolerances::for_instrument(instrument.instrument_type());
        Self::from_instrument_with_tolerance(instrument, curves, target_pv, tolerance)
    }

    /// Reprices an instrument with a custom tolerance.
    pub fn from_instrument_with_tolerance(
        instrument: &dyn CalibrationInstrument,
        curves: &CurveSet,
        target_pv: f64,
        tolerance: f64,
    ) -> CurveResult<Self> {
        let model_pv = instrument.pv(curves)?;

        Ok(Self::new(
            instrument.description(),
            instrument.instrument_type(),
            target_pv,
            model_pv,
            tolerance,
        ))
    }
}

impl fmt::Display for RepricingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "ok" } else { "FAIL" };
        write!(
            f,
            "{:>4} {} | PV: {:.2e} | Error: {:.2e} (tol: {:.2e})",
            status, self.instrument_id, self.model_pv, self.error, self.tolerance
        )
    }
}

/// Repricing results for a whole instrument set.
#[derive(Debug, Clone)]
pub struct RepricingReport {
    checks: Vec<RepricingCheck>,
    max_error: f64,
    rms_error: f64,
    passed_count: usize,
}

impl RepricingReport {
    /// Creates a report from individual checks.
    #[must_use]
    pub fn new(checks: Vec<RepricingCheck>) -> Self {
        let max_error = checks.iter().map(|c| c.error).fold(0.0_f64, f64::max);

        let rms_error = if checks.is_empty() {
            0.0
        } else {
            let sum_sq: f64 = checks.iter().map(|c| c.error * c.error).sum();
            (sum_sq / checks.len() as f64).sqrt()
        };

        let passed_count = checks.iter().filter(|c| c.passed).count();

        Self {
            checks,
            max_error,
            rms_error,
            passed_count,
        }
    }

    /// Whether every instrument passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.passed_count == self.checks.len()
    }

    /// Individual checks, in instrument order.
    #[must_use]
    pub fn checks(&self) -> &[RepricingCheck] {
        &self.checks
    }

    /// Largest absolute error.
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    /// RMS error.
    #[must_use]
    pub fn rms_error(&self) -> f64 {
        self.rms_error
    }

    /// Number of instruments that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    /// Number of instruments that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count
    }

    /// Descriptions of the failed instruments.
    #[must_use]
    pub fn failed_instruments(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.instrument_id.as_str())
            .collect()
    }
}

impl fmt::Display for RepricingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repricing Report")?;
        writeln!(f, "================")?;
        writeln!(f, "Status: {}", if self.is_valid() { "PASSED" } else { "FAILED" })?;
        writeln!(f, "Instruments: {}/{} passed", self.passed_count, self.checks.len())?;
        writeln!(f, "Max Error: {:.2e}", self.max_error)?;
        writeln!(f, "RMS Error: {:.2e}", self.rms_error)?;

        if !self.checks.is_empty() {
            writeln!(f)?;
            writeln!(f, "Details:")?;
            for check in &self.checks {
                writeln!(f, "  {check}")?;
            }
        }

        Ok(())
    }
}

/// Reprices every instrument against zero target PV.
///
/// `tolerance` overrides the per-type defaults when given.
pub fn reprice(
    curves: &CurveSet,
    instruments: &InstrumentSet,
    tolerance: Option<f64>,
) -> CurveResult<RepricingReport> {
    let checks = instruments
        .iter()
        .map(|instrument| match tolerance {
            Some(tol) => RepricingCheck::from_instrument_with_tolerance(instrument, curves, 0.0, tol),
            None => RepricingCheck::from_instrument(instrument, curves, 0.0),
        })
        .collect::<CurveResult<Vec<_>>>()?;
    Ok(RepricingReport::new(checks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::test_support::{build_date, d, market};
    use crate::instruments::Deposit;

    #[test]
    fn test_check_pass_and_fail() {
        let pass = RepricingCheck::new("a".into(), InstrumentType::Deposit, 0.0, 5e-10, tolerances::DEPOSIT);
        assert!(pass.passed);

        let fail = RepricingCheck::new("b".into(), InstrumentType::Deposit, 0.0, 1e-6, tolerances::DEPOSIT);
        assert!(!fail.passed);
        assert!(format!("{fail}").contains("FAIL"));

        let nan = RepricingCheck::new("c".into(), InstrumentType::Swap, 0.0, f64::NAN, 1.0);
        assert!(!nan.passed);
    }

    #[test]
    fn test_report_statistics() {
        let report = RepricingReport::new(vec![
            RepricingCheck::new("a".into(), InstrumentType::Fra, 0.0, 3e-10, 1e-9),
            RepricingCheck::new("b".into(), InstrumentType::Fra, 0.0, -4e-3, 1e-9),
        ]);

        assert!(!report.is_valid());
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed_instruments(), vec!["b"]);
        assert!((report.max_error() - 4e-3).abs() < 1e-15);
        assert!(report.rms_error() > 0.0);
        assert!(format!("{report}").contains("1/2 passed"));
    }

    #[test]
    fn test_empty_report_is_valid() {
        let report = RepricingReport::new(Vec::new());
        assert!(report.is_valid());
        assert_eq!(report.max_error(), 0.0);
    }

    #[test]
    fn test_reprice_off_market_deposit_fails() {
        let curves = market();
        let instruments =
            InstrumentSet::new().with(Deposit::new("USD.LIBOR", build_date(), d(2025, 4, 15), 0.25));

        let report = reprice(&curves, &instruments, None).unwrap();
        assert!(!report.is_valid());

        let relaxed = reprice(&curves, &instruments, Some(1.0)).unwrap();
        assert!(relaxed.is_valid());
    }
}
