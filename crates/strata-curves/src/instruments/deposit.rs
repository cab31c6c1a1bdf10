//! Money market deposit.

use strata_core::calendars::{shift, BusinessDayConvention, WeekendCalendar};
use strata_core::daycounts::DayCountConvention;
use strata_core::types::{Date, Tenor};

use super::{discount_with_delta, CalibrationInstrument, InstrumentType, SensitivityMap};
use crate::error::CurveResult;
use crate::market::CurveSet;

/// A money market deposit.
///
/// # Pricing
///
/// Lend the notional at `start`, receive it back with simple interest at
/// `end`:
///
/// ```text
/// PV = N × [(1 + r × τ) × DF(end) - DF(start)]
/// ```
///
/// The deposit calibrates the curve it discounts on.
#[derive(Debug, Clone)]
pub struct Deposit {
    curve: String,
    start_date: Date,
    end_date: Date,
    rate: f64,
    day_count: DayCountConvention,
    notional: f64,
}

impl Deposit {
    /// Creates a deposit with ACT/360 accrual.
    #[must_use]
    pub fn new(curve: impl Into<String>, start_date: Date, end_date: Date, rate: f64) -> Self {
        Self {
            curve: curve.into(),
            start_date,
            end_date,
            rate,
            day_count: DayCountConvention::Act360,
            notional: 1.0,
        }
    }

    /// Creates a deposit maturing `tenor` after `start_date`, rolled Modified
    /// Following over weekends.
    pub fn from_tenor(
        curve: impl Into<String>,
        start_date: Date,
        tenor: Tenor,
        rate: f64,
    ) -> CurveResult<Self> {
        let end_date = shift(
            start_date,
            tenor,
            BusinessDayConvention::ModifiedFollowing,
            &WeekendCalendar,
        )?;
        Ok(Self::new(curve, start_date, end_date, rate))
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

    /// Deposit rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maturity date.
    pub fn end_date(&self) -> Date {
        self.end_date
    }

    fn accrual(&self) -> f64 {
        self.day_count.year_fraction(self.start_date, self.end_date)
    }
}

impl CalibrationInstrument for Deposit {
    fn solve_curve(&self) -> &str {
        &self.curve
    }

    fn pillar_date(&self) -> Date {
        self.end_date
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let df_start = curves.discount_factor(&self.curve, self.start_date)?;
        let df_end = curves.discount_factor(&self.curve, self.end_date)?;
        Ok(self.notional * ((1.0 + self.rate * self.accrual()) * df_end - df_start))
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let (_, ddf_start) = discount_with_delta(curves, &self.curve, self.start_date)?;
        let (_, ddf_end) = discount_with_delta(curves, &self.curve, self.end_date)?;

        let mut sens = SensitivityMap::new();
        sens.add(&self.curve, self.start_date, -self.notional * ddf_start);
        sens.add(
            &self.curve,
            self.end_date,
            self.notional * (1.0 + self.rate * self.accrual()) * ddf_end,
        );
        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        vec![&self.curve]
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Deposit
    }

    fn description(&self) -> String {
        format!(
            "Deposit {} {} @ {:.4}%",
            self.curve,
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
    fn test_deposit_pv_zero_at_implied_rate() {
        let curves = market();
        let start = build_date();
        let end = d(2025, 4, 15);
        let df = curves.discount_factor("USD.LIBOR", end).unwrap();
        let tau = DayCountConvention::Act360.year_fraction(start, end);
        let implied = (1.0 / df - 1.0) / tau;

        let dep = Deposit::new("USD.LIBOR", start, end, implied);
        assert_relative_eq!(dep.pv(&curves).unwrap(), 0.0, epsilon = 1e-14);

        let rich = Deposit::new("USD.LIBOR", start, end, implied + 0.01).with_notional(1e6);
        assert!(rich.pv(&curves).unwrap() > 0.0);
    }

    #[test]
    fn test_deposit_from_tenor() {
        let dep = Deposit::from_tenor("USD.LIBOR", build_date(), Tenor::months(3), 0.05).unwrap();
        assert_eq!(dep.pillar_date(), d(2025, 4, 15));
        assert_eq!(dep.curve_names(), vec!["USD.LIBOR"]);
    }

    #[test]
    fn test_deposit_sensitivities() {
        let curves = market();
        let spot = d(2025, 1, 17);
        assert_sensitivities_match(&curves, &Deposit::new("USD.LIBOR", spot, d(2025, 7, 15), 0.05));
        assert_sensitivities_match(&curves, &Deposit::new("USD.OIS", spot, d(2025, 10, 15), 0.045).with_notional(10.0));
    }
}
