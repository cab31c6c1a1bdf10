//! Forward rate agreement.

use strata_core::daycounts::DayCountConvention;
use strata_core::types::Date;

use super::{discount_with_delta, CalibrationInstrument, InstrumentType, SensitivityMap};
use crate::error::CurveResult;
use crate::market::CurveSet;

/// Forward rate agreement paying `forward - rate` on `[start, end]`.
///
/// # Pricing
///
/// With `A = DFf(start) / DFf(end)` from the forecast curve:
///
/// ```text
/// PV = N × DFd(end) × [(A - 1) - K × τ]
/// ```
///
/// The FRA calibrates its forecast curve unless told otherwise.
#[derive(Debug, Clone)]
pub struct Fra {
    forecast_curve: String,
    discount_curve: String,
    solve_curve: String,
    start_date: Date,
    end_date: Date,
    rate: f64,
    day_count: DayCountConvention,
    notional: f64,
}

impl Fra {
    /// Creates a FRA with ACT/360 accrual.
    #[must_use]
    pub fn new(
        forecast_curve: impl Into<String>,
        discount_curve: impl Into<String>,
        start_date: Date,
        end_date: Date,
        rate: f64,
    ) -> Self {
        let forecast_curve = forecast_curve.into();
        Self {
            solve_curve: forecast_curve.clone(),
            forecast_curve,
            discount_curve: discount_curve.into(),
            start_date,
            end_date,
            rate,
            day_count: DayCountConvention::Act360,
            notional: 1.0,
        }
    }

    /// Assigns the FRA's equation to another curve.
    #[must_use]
    pub fn with_solve_curve(mut self, curve: impl Into<String>) -> Self {
        self.solve_curve = curve.into();
        self
    }

    /// Sets the day count convention.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the notional.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Contract rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn accrual(&self) -> f64 {
        self.day_count.year_fraction(self.start_date, self.end_date)
    }
}

impl CalibrationInstrument for Fra {
    fn solve_curve(&self) -> &str {
        &self.solve_curve
    }

    fn pillar_date(&self) -> Date {
        self.end_date
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let ratio = curves.discount_factor(&self.forecast_curve, self.start_date)?
            / curves.discount_factor(&self.forecast_curve, self.end_date)?;
        let df = curves.discount_factor(&self.discount_curve, self.end_date)?;
        Ok(self.notional * df * ((ratio - 1.0) - self.rate * self.accrual()))
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let (df_fs, ddf_fs) = discount_with_delta(curves, &self.forecast_curve, self.start_date)?;
        let (df_fe, ddf_fe) = discount_with_delta(curves, &self.forecast_curve, self.end_date)?;
        let (df_d, ddf_d) = discount_with_delta(curves, &self.discount_curve, self.end_date)?;
        let ratio = df_fs / df_fe;
        let n = self.notional;

        let mut sens = SensitivityMap::new();
        sens.add(&self.forecast_curve, self.start_date, n * df_d * ddf_fs / df_fe);
        sens.add(&self.forecast_curve, self.end_date, -n * df_d * ratio * ddf_fe / df_fe);
        sens.add(
            &self.discount_curve,
            self.end_date,
            n * ddf_d * ((ratio - 1.0) - self.rate * self.accrual()),
        );
        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        vec![&self.forecast_curve, &self.discount_curve]
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Fra
    }

    fn description(&self) -> String {
        format!(
            "FRA {} {}x{} @ {:.4}%",
            self.forecast_curve,
            self.start_date,
            self.end_date,
            self.rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fra_at_forward_rate() {
        let curves = market();
        let (start, end) = (d(2025, 4, 15), d(2025, 7, 15));
        let fwd = curves
            .forward_rate("USD.LIBOR", start, end, DayCountConvention::Act360)
            .unwrap();
        let fra = Fra::new("USD.LIBOR", "USD.OIS", start, end, fwd);
        assert_relative_eq!(fra.pv(&curves).unwrap(), 0.0, epsilon = 1e-14);
        assert_eq!(fra.solve_curve(), "USD.LIBOR");
        assert_eq!(fra.with_solve_curve("USD.OIS").solve_curve(), "USD.OIS");
    }

    #[test]
    fn test_fra_sensitivities() {
        let curves = market();
        let (start, end) = (d(2025, 7, 15), d(2026, 1, 15));
        assert_sensitivities_match(&curves, &Fra::new("USD.LIBOR", "USD.OIS", start, end, 0.04));
        // Same curve for forecasting and discounting
        assert_sensitivities_match(&curves, &Fra::new("USD.LIBOR", "USD.LIBOR", start, end, 0.06).with_notional(3.0));
    }
}
