//! Forward price curve.

use strata_core::types::{Currency, Date};

use super::{delegate_pillar_curve, CurveKind, Pillars};
use crate::error::CurveResult;

/// Commodity or asset forward prices by delivery date.
#[derive(Debug, Clone)]
pub struct PriceCurve {
    pub(crate) pillars: Pillars,
    currency: Currency,
}

impl PriceCurve {
    /// Creates a curve from pillar dates and price guesses.
    pub fn new(
        name: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        prices: Vec<f64>,
    ) -> CurveResult<Self> {
        Ok(Self {
            pillars: Pillars::new(name, build_date, dates, prices)?,
            currency: Currency::default(),
        })
    }

    /// Sets the currency prices are quoted in.
    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Quote currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Forward price for delivery on `date`.
    pub fn price(&self, date: Date) -> CurveResult<f64> {
        self.pillars.value_at(date)
    }
}

delegate_pillar_curve!(PriceCurve, CurveKind::Price);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_price_interpolation() {
        let build = Date::from_ymd(2025, 1, 1).unwrap();
        let p1 = Date::from_ymd(2025, 7, 1).unwrap();
        let p2 = Date::from_ymd(2026, 1, 1).unwrap();
        let curve = PriceCurve::new("WTI", build, vec![p1, p2], vec![70.0, 80.0]).unwrap();

        assert_relative_eq!(curve.price(p1).unwrap(), 70.0);
        assert_relative_eq!(curve.price(build).unwrap(), 70.0);
        assert_relative_eq!(curve.price(p2.add_days(30)).unwrap(), 80.0);
        let mid = curve.price(Date::from_ymd(2025, 10, 1).unwrap()).unwrap();
        assert!(mid > 70.0 && mid < 80.0);
    }
}
