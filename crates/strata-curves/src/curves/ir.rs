//! Interest-rate curve.

use strata_core::daycounts::DayCountConvention;
use strata_core::types::{Currency, Date};

use super::{delegate_pillar_curve, CurveKind, Pillars};
use crate::error::{CurveError, CurveResult};

/// Discount/forecast curve stored as continuously-compounded zero rates.
///
/// `DF(d) = exp(-r(d) * t(d))` with `t` in ACT/365F years from the build date
/// and `r` interpolated between pillars.
#[derive(Debug, Clone)]
pub struct IrCurve {
    pub(crate) pillars: Pillars,
    currency: Currency,
}

impl IrCurve {
    /// Creates a curve from pillar dates and zero-rate guesses.
    pub fn new(
        name: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        zero_rates: Vec<f64>,
    ) -> CurveResult<Self> {
        Ok(Self {
            pillars: Pillars::new(name, build_date, dates, zero_rates)?,
            currency: Currency::default(),
        })
    }

    /// Creates a curve with every pillar at the same zero rate.
    pub fn flat(
        name: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        rate: f64,
    ) -> CurveResult<Self> {
        let rates = vec![rate; dates.len()];
        Self::new(name, build_date, dates, rates)
    }

    /// Sets the curve currency.
    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Curve currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Curve time of `date`.
    pub fn time(&self, date: Date) -> f64 {
        self.pillars.time(date)
    }

    /// Zero rate at `date`.
    pub fn zero_rate(&self, date: Date) -> CurveResult<f64> {
        self.pillars.value_at(date)
    }

    /// Discount factor at `date`.
    pub fn discount_factor(&self, date: Date) -> CurveResult<f64> {
        let t = self.time(date);
        let r = self.zero_rate(date)?;
        Ok((-r * t).exp())
    }

    /// Simply-compounded forward rate between two dates.
    pub fn forward_rate(&self, start: Date, end: Date, day_count: DayCountConvention) -> CurveResult<f64> {
        let tau = day_count.year_fraction(start, end);
        if tau <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "forward period {start} to {end} has non-positive length"
            )));
        }
        let ratio = self.discount_factor(start)? / self.discount_factor(end)?;
        Ok((ratio - 1.0) / tau)
    }
}

delegate_pillar_curve!(IrCurve, CurveKind::InterestRate);
