//! Credit default swap.

use strata_core::daycounts::DayCountConvention;
use strata_core::types::{Date, Frequency};

use super::schedule::weekend_schedule;
use super::{CalibrationInstrument, InstrumentType};
use crate::error::{CurveError, CurveResult};
use crate::market::CurveSet;

/// Running-spread CDS, valued from the protection buyer's side.
///
/// # Pricing
///
/// For each premium period `[sₖ₋₁, sₖ]` with survival `S` from the hazard
/// curve and default assumed at the period midpoint `mₖ`:
///
/// ```text
/// protection = (1 - R) × Σ DF(mₖ) × (S(sₖ₋₁) - S(sₖ))
/// premium    = s × Σ τₖ × [DF(sₖ) × S(sₖ) + ½ × DF(mₖ) × (S(sₖ₋₁) - S(sₖ))]
/// PV         = N × (protection - premium)
/// ```
///
/// Recovery defaults to the hazard curve's. The CDS calibrates the hazard
/// curve; its Jacobian is always bump-and-revalue.
#[derive(Debug, Clone)]
pub struct Cds {
    hazard_curve: String,
    discount_curve: String,
    start_date: Date,
    maturity: Date,
    spread: f64,
    recovery: Option<f64>,
    frequency: Frequency,
    day_count: DayCountConvention,
    notional: f64,
}

impl Cds {
    /// Creates a quarterly ACT/360 CDS.
    #[must_use]
    pub fn new(
        hazard_curve: impl Into<String>,
        discount_curve: impl Into<String>,
        start_date: Date,
        maturity: Date,
        spread: f64,
    ) -> Self {
        Self {
            hazard_curve: hazard_curve.into(),
            discount_curve: discount_curve.into(),
            start_date,
            maturity,
            spread,
            recovery: None,
            frequency: Frequency::Quarterly,
            day_count: DayCountConvention::Act360,
            notional: 1.0,
        }
    }

    /// Overrides the hazard curve's recovery rate.
    pub fn with_recovery(mut self, recovery: f64) -> CurveResult<Self> {
        if !(0.0..1.0).contains(&recovery) {
            return Err(CurveError::invalid_instrument(format!(
                "CDS recovery {recovery} outside [0, 1)"
            )));
        }
        self.recovery = Some(recovery);
        Ok(self)
    }

    /// Sets the premium frequency.
    #[must_use]
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the notional.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Running spread.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Protection leg PV and risky annuity (premium PV per unit spread).
    pub fn legs(&self, curves: &CurveSet) -> CurveResult<(f64, f64)> {
        let hazard = curves.hazard_curve(&self.hazard_curve)?;
        let recovery = self.recovery.unwrap_or_else(|| hazard.recovery());

        let mut protection = 0.0;
        let mut annuity = 0.0;
        let mut survival_prev = hazard.survival_probability(self.start_date)?;
        for w in weekend_schedule(self.start_date, self.maturity, self.frequency)?.windows(2) {
            let (prev, date) = (w[0], w[1]);
            let tau = self.day_count.year_fraction(prev, date);
            let mid = prev.add_days(prev.days_between(&date) / 2);

            let survival = hazard.survival_probability(date)?;
            let default_prob = survival_prev - survival;
            let df_pay = curves.discount_factor(&self.discount_curve, date)?;
            let df_mid = curves.discount_factor(&self.discount_curve, mid)?;

            protection += df_mid * default_prob;
            annuity += tau * (df_pay * survival + 0.5 * df_mid * default_prob);
            survival_prev = survival;
        }

        Ok((
            self.notional * (1.0 - recovery) * protection,
            self.notional * annuity,
        ))
    }

    /// Spread that sets the PV to zero.
    pub fn fair_spread(&self, curves: &CurveSet) -> CurveResult<f64> {
        let (protection, annuity) = self.legs(curves)?;
        Ok(protection / annuity)
    }
}

impl CalibrationInstrument for Cds {
    fn solve_curve(&self) -> &str {
        &self.hazard_curve
    }

    fn pillar_date(&self) -> Date {
        self.maturity
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let (protection, annuity) = self.legs(curves)?;
        Ok(protection - self.spread * annuity)
    }

    fn curve_names(&self) -> Vec<&str> {
        vec![&self.hazard_curve, &self.discount_curve]
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Cds
    }

    fn description(&self) -> String {
        format!(
            "CDS {} {} @ {:.1}bp",
            self.hazard_curve,
            self.maturity,
            self.spread * 10_000.0
        )
    }
}
