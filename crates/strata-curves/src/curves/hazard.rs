//! Credit hazard curve.

use strata_core::types::Date;

use super::{delegate_pillar_curve, CurveKind, Pillars};
use crate::error::{CurveError, CurveResult};

/// Default recovery rate.
pub const DEFAULT_RECOVERY: f64 = 0.4;

/// Survival curve stored as zero hazard rates.
///
/// `S(d) = exp(-h(d) * t(d))`.
#[derive(Debug, Clone)]
pub struct HazardCurve {
    pub(crate) pillars: Pillars,
    recovery: f64,
}

impl HazardCurve {
    /// Creates a curve from pillar dates and hazard-rate guesses.
    pub fn new(
        name: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        hazard_rates: Vec<f64>,
    ) -> CurveResult<Self> {
        Ok(Self {
            pillars: Pillars::new(name, build_date, dates, hazard_rates)?,
            recovery: DEFAULT_RECOVERY,
        })
    }

    /// Sets the recovery rate, which must lie in `[0, 1)`.
    pub fn with_recovery(mut self, recovery: f64) -> CurveResult<Self> {
        if !(0.0..1.0).contains(&recovery) {
            return Err(CurveError::invalid_value(format!(
                "recovery {recovery} outside [0, 1)"
            )));
        }
        self.recovery = recovery;
        Ok(self)
    }

    /// Recovery rate.
    pub fn recovery(&self) -> f64 {
        self.recovery
    }

    /// Zero hazard rate at `date`.
    pub fn hazard_rate(&self, date: Date) -> CurveResult<f64> {
        self.pillars.value_at(date)
    }

    /// Survival probability to `date`.
    pub fn survival_probability(&self, date: Date) -> CurveResult<f64> {
        let t = self.pillars.time(date);
        Ok((-self.hazard_rate(date)? * t).exp())
    }

    /// Default probability by `date`.
    pub fn default_probability(&self, date: Date) -> CurveResult<f64> {
        Ok(1.0 - self.survival_probability(date)?)
    }
}

delegate_pillar_curve!(HazardCurve, CurveKind::Hazard);
