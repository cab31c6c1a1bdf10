//! Fixed-for-floating interest rate swap.

use strata_core::daycounts::DayCountConvention;
use strata_core::types::{Date, Frequency};

use super::schedule::weekend_schedule;
use super::{discount_with_delta, CalibrationInstrument, InstrumentType, SensitivityMap};
use crate::error::CurveResult;
use crate::market::CurveSet;

/// Interest rate swap: receive floating, pay fixed.
///
/// # Pricing
///
/// Floating coupons project from the forecast curve; both legs discount on
/// the discount curve:
///
/// ```text
/// PV = N × Σ DFd(eᵢ) × (DFf(sᵢ)/DFf(eᵢ) - 1)  -  N × K × Σ τⱼ × DFd(eⱼ)
/// ```
///
/// Defaults: annual 30/360 fixed leg, quarterly ACT/360 floating leg. The
/// swap calibrates its forecast curve unless told otherwise.
#[derive(Debug, Clone)]
pub struct IrSwap {
    forecast_curve: String,
    discount_curve: String,
    solve_curve: String,
    start_date: Date,
    maturity: Date,
    fixed_rate: f64,
    fixed_frequency: Frequency,
    fixed_day_count: DayCountConvention,
    float_frequency: Frequency,
    notional: f64,
}

impl IrSwap {
    /// Creates a swap with market-standard leg conventions.
    #[must_use]
    pub fn new(
        forecast_curve: impl Into<String>,
        discount_curve: impl Into<String>,
        start_date: Date,
        maturity: Date,
        fixed_rate: f64,
    ) -> Self {
        let forecast_curve = forecast_curve.into();
        Self {
            solve_curve: forecast_curve.clone(),
            forecast_curve,
            discount_curve: discount_curve.into(),
            start_date,
            maturity,
            fixed_rate,
            fixed_frequency: Frequency::Annual,
            fixed_day_count: DayCountConvention::Thirty360,
            float_frequency: Frequency::Quarterly,
            notional: 1.0,
        }
    }

    /// Assigns the swap's equation to another curve.
    #[must_use]
    pub fn with_solve_curve(mut self, curve: impl Into<String>) -> Self {
        self.solve_curve = curve.into();
        self
    }

    /// Sets the fixed leg frequency and day count.
    #[must_use]
    pub fn with_fixed_leg(mut self, frequency: Frequency, day_count: DayCountConvention) -> Self {
        self.fixed_frequency = frequency;
        self.fixed_day_count = day_count;
        self
    }

    /// Sets the floating leg frequency.
    #[must_use]
    pub fn with_float_frequency(mut self, frequency: Frequency) -> Self {
        self.float_frequency = frequency;
        self
    }

    /// Sets the notional.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Fixed rate.
    pub fn fixed_rate(&self) -> f64 {
        self.fixed_rate
    }

    /// Fixed leg PV per unit fixed rate.
    pub fn annuity(&self, curves: &CurveSet) -> CurveResult<f64> {
        let dates = weekend_schedule(self.start_date, self.maturity, self.fixed_frequency)?;
        let mut annuity = 0.0;
        for w in dates.windows(2) {
            let tau = self.fixed_day_count.year_fraction(w[0], w[1]);
            annuity += tau * curves.discount_factor(&self.discount_curve, w[1])?;
        }
        Ok(self.notional * annuity)
    }

    /// Floating leg PV.
    pub fn float_leg_pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let dates = weekend_schedule(self.start_date, self.maturity, self.float_frequency)?;
        let mut pv = 0.0;
        for w in dates.windows(2) {
            let ratio = curves.discount_factor(&self.forecast_curve, w[0])?
                / curves.discount_factor(&self.forecast_curve, w[1])?;
            pv += (ratio - 1.0) * curves.discount_factor(&self.discount_curve, w[1])?;
        }
        Ok(self.notional * pv)
    }

    /// Fixed rate that sets the PV to zero.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        Ok(self.float_leg_pv(curves)? / self.annuity(curves)?)
    }
}

impl CalibrationInstrument for IrSwap {
    fn solve_curve(&self) -> &str {
        &self.solve_curve
    }

    fn pillar_date(&self) -> Date {
        self.maturity
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        Ok(self.float_leg_pv(curves)? - self.fixed_rate * self.annuity(curves)?)
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let n = self.notional;
        let mut sens = SensitivityMap::new();

        for w in weekend_schedule(self.start_date, self.maturity, self.float_frequency)?.windows(2) {
            let (df_s, ddf_s) = discount_with_delta(curves, &self.forecast_curve, w[0])?;
            let (df_e, ddf_e) = discount_with_delta(curves, &self.forecast_curve, w[1])?;
            let (df_d, ddf_d) = discount_with_delta(curves, &self.discount_curve, w[1])?;
            let ratio = df_s / df_e;
            sens.add(&self.forecast_curve, w[0], n * df_d * ddf_s / df_e);
            sens.add(&self.forecast_curve, w[1], -n * df_d * ratio * ddf_e / df_e);
            sens.add(&self.discount_curve, w[1], n * (ratio - 1.0) * ddf_d);
        }

        for w in weekend_schedule(self.start_date, self.maturity, self.fixed_frequency)?.windows(2) {
            let tau = self.fixed_day_count.year_fraction(w[0], w[1]);
            let (_, ddf_d) = discount_with_delta(curves, &self.discount_curve, w[1])?;
            sens.add(&self.discount_curve, w[1], -n * self.fixed_rate * tau * ddf_d);
        }

        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        vec![&self.forecast_curve, &self.discount_curve]
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Swap
    }

    fn description(&self) -> String {
        format!(
            "IRS {} {} @ {:.4}%",
            self.forecast_curve,
            self.maturity,
            self.fixed_rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_par_swap_prices_to_zero() {
        let curves = market();
        let swap = IrSwap::new("USD.LIBOR", "USD.OIS", d(2025, 1, 17), d(2027, 1, 19), 0.0);
        let par = swap.par_rate(&curves).unwrap();
        assert!(par > 0.04 && par < 0.07, "par rate {par}");

        let at_par = IrSwap::new("USD.LIBOR", "USD.OIS", d(2025, 1, 17), d(2027, 1, 19), par);
        assert_relative_eq!(at_par.pv(&curves).unwrap(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_single_curve_float_leg_telescopes() {
        let curves = market();
        let (start, end) = (d(2025, 1, 17), d(2026, 1, 20));
        let swap = IrSwap::new("USD.LIBOR", "USD.LIBOR", start, end, 0.05);
        let expected = curves.discount_factor("USD.LIBOR", start).unwrap()
            - curves.discount_factor("USD.LIBOR", end).unwrap();
        assert_relative_eq!(swap.float_leg_pv(&curves).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_swap_sensitivities() {
        let curves = market();
        let swap = IrSwap::new("USD.LIBOR", "USD.OIS", d(2025, 1, 17), d(2028, 1, 18), 0.052)
            .with_fixed_leg(Frequency::SemiAnnual, DayCountConvention::Thirty360);
        assert_sensitivities_match(&curves, &swap);
    }
}
