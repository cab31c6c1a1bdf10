//! Float-for-float basis swap.

use strata_core::daycounts::DayCountConvention;
use strata_core::types::{Date, Frequency};

use super::schedule::weekend_schedule;
use super::{discount_with_delta, CalibrationInstrument, InstrumentType, SensitivityMap};
use crate::error::CurveResult;
use crate::market::CurveSet;

/// Basis swap: receive the spread leg's index plus a spread, pay the flat
/// leg's index.
///
/// # Pricing
///
/// Both legs share one schedule and discount on the discount curve. With
/// `Aᵢ = DF(sᵢ)/DF(eᵢ)` on each leg's forecast curve:
///
/// ```text
/// PV = N × Σ DFd(eᵢ) × [(Aᵢˢᵖʳᵉᵃᵈ - 1 + s × τᵢ) - (Aᵢᶠˡᵃᵗ - 1)]
/// ```
///
/// The swap calibrates the spread leg's curve unless told otherwise.
#[derive(Debug, Clone)]
pub struct BasisSwap {
    spread_leg_curve: String,
    flat_leg_curve: String,
    discount_curve: String,
    solve_curve: String,
    start_date: Date,
    maturity: Date,
    spread: f64,
    frequency: Frequency,
    day_count: DayCountConvention,
    notional: f64,
}

impl BasisSwap {
    /// Creates a quarterly ACT/360 basis swap.
    #[must_use]
    pub fn new(
        spread_leg_curve: impl Into<String>,
        flat_leg_curve: impl Into<String>,
        discount_curve: impl Into<String>,
        start_date: Date,
        maturity: Date,
        spread: f64,
    ) -> Self {
        let spread_leg_curve = spread_leg_curve.into();
        Self {
            solve_curve: spread_leg_curve.clone(),
            spread_leg_curve,
            flat_leg_curve: flat_leg_curve.into(),
            discount_curve: discount_curve.into(),
            start_date,
            maturity,
            spread,
            frequency: Frequency::Quarterly,
            day_count: DayCountConvention::Act360,
            notional: 1.0,
        }
    }

    /// Assigns the swap's equation to another curve.
    #[must_use]
    pub fn with_solve_curve(mut self, curve: impl Into<String>) -> Self {
        self.solve_curve = curve.into();
        self
    }

    /// Sets the payment frequency of both legs.
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

    /// Quoted spread.
    pub fn spread(&self) -> f64 {
        self.spread
    }
}

impl CalibrationInstrument for BasisSwap {
    fn solve_curve(&self) -> &str {
        &self.solve_curve
    }

    fn pillar_date(&self) -> Date {
        self.maturity
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let mut pv = 0.0;
        for w in weekend_schedule(self.start_date, self.maturity, self.frequency)?.windows(2) {
            let tau = self.day_count.year_fraction(w[0], w[1]);
            let spread_ratio = curves.discount_factor(&self.spread_leg_curve, w[0])?
                / curves.discount_factor(&self.spread_leg_curve, w[1])?;
            let flat_ratio = curves.discount_factor(&self.flat_leg_curve, w[0])?
                / curves.discount_factor(&self.flat_leg_curve, w[1])?;
            let df = curves.discount_factor(&self.discount_curve, w[1])?;
            pv += df * ((spread_ratio - 1.0 + self.spread * tau) - (flat_ratio - 1.0));
        }
        Ok(self.notional * pv)
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let n = self.notional;
        let mut sens = SensitivityMap::new();

        for w in weekend_schedule(self.start_date, self.maturity, self.frequency)?.windows(2) {
            let tau = self.day_count.year_fraction(w[0], w[1]);
            let (df_d, ddf_d) = discount_with_delta(curves, &self.discount_curve, w[1])?;

            let mut coupon = self.spread * tau;
            for (curve, sign) in [(&self.spread_leg_curve, 1.0), (&self.flat_leg_curve, -1.0)] {
                let (df_s, ddf_s) = discount_with_delta(curves, curve, w[0])?;
                let (df_e, ddf_e) = discount_with_delta(curves, curve, w[1])?;
                let ratio = df_s / df_e;
                coupon += sign * (ratio - 1.0);
                sens.add(curve, w[0], sign * n * df_d * ddf_s / df_e);
                sens.add(curve, w[1], -sign * n * df_d * ratio * ddf_e / df_e);
            }
            sens.add(&self.discount_curve, w[1], n * coupon * ddf_d);
        }

        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        vec![&self.spread_leg_curve, &self.flat_leg_curve, &self.discount_curve]
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::BasisSwap
    }

    fn description(&self) -> String {
        format!(
            "Basis {}/{} {} @ {:.1}bp",
            self.spread_leg_curve,
            self.flat_leg_curve,
            self.maturity,
            self.spread * 10_000.0
        )
    }
}
