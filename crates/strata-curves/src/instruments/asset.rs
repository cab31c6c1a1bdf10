//! Asset and commodity instruments.
//!
//! Both instruments read prices through
//! [`CurveSet::price`](crate::market::CurveSet::price), so they can sit on a
//! plain price curve or on a basis curve. Price sensitivities are reported
//! on every curve of the basis chain: a unit move in the basis spread and a
//! unit move in its base price move the resolved price alike.

use strata_core::types::{Currency, Date};

use super::{CalibrationInstrument, InstrumentType, SensitivityMap, Settlement};
use crate::error::{CurveError, CurveResult};
use crate::market::CurveSet;

/// Forward contract on a price curve.
///
/// ```text
/// PV = N × FX × DF(payment) × (P(delivery) - K)
/// ```
///
/// Without a discount curve `DF = 1`; without a currency pair `FX = 1`.
#[derive(Debug, Clone)]
pub struct AssetForward {
    price_curve: String,
    delivery_date: Date,
    payment_date: Date,
    strike: f64,
    settlement: Settlement,
    notional: f64,
}

impl AssetForward {
    /// Creates an undiscounted forward paying on delivery.
    #[must_use]
    pub fn new(price_curve: impl Into<String>, delivery_date: Date, strike: f64) -> Self {
        Self {
            price_curve: price_curve.into(),
            delivery_date,
            payment_date: delivery_date,
            strike,
            settlement: Settlement::default(),
            notional: 1.0,
        }
    }

    /// Discounts the payoff on an interest-rate curve.
    #[must_use]
    pub fn with_discount_curve(mut self, curve: impl Into<String>) -> Self {
        self.settlement.discount_curve = Some(curve.into());
        self
    }

    /// Converts the payoff from `from` into `to` at spot.
    #[must_use]
    pub fn with_fx(mut self, from: Currency, to: Currency) -> Self {
        self.settlement.fx = Some((from, to));
        self
    }

    /// Pays on `date` instead of the delivery date.
    #[must_use]
    pub fn with_payment_date(mut self, date: Date) -> Self {
        self.payment_date = date;
        self
    }

    /// Sets the notional.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Strike price.
    pub fn strike(&self) -> f64 {
        self.strike
    }
}

impl CalibrationInstrument for AssetForward {
    fn solve_curve(&self) -> &str {
        &self.price_curve
    }

    fn pillar_date(&self) -> Date {
        self.delivery_date
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let price = curves.price(&self.price_curve, self.delivery_date)?;
        let fx = self.settlement.fx_rate(curves)?;
        let (df, _) = self.settlement.discount(curves, self.payment_date)?;
        Ok(self.notional * fx * df * (price - self.strike))
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let price = curves.price(&self.price_curve, self.delivery_date)?;
        let scale = self.notional * self.settlement.fx_rate(curves)?;
        let (df, ddf) = self.settlement.discount(curves, self.payment_date)?;

        let mut sens = SensitivityMap::new();
        for curve in curves.price_chain(&self.price_curve)? {
            sens.add(curve, self.delivery_date, scale * df);
        }
        if let Some(curve) = &self.settlement.discount_curve {
            sens.add(curve, self.payment_date, scale * ddf * (price - self.strike));
        }
        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        let mut names = vec![self.price_curve.as_str()];
        names.extend(self.settlement.discount_curve.as_deref());
        names
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::AssetForward
    }

    fn description(&self) -> String {
        format!(
            "Forward {} {} @ {:.4}",
            self.price_curve, self.delivery_date, self.strike
        )
    }
}

/// Swap on the arithmetic average of forward prices over fixing dates.
///
/// ```text
/// PV = N × FX × DF(payment) × (1/n × Σ P(fᵢ) - K)
/// ```
///
/// The pillar date is the last fixing.
#[derive(Debug, Clone)]
pub struct AveragePriceSwap {
    price_curve: String,
    fixing_dates: Vec<Date>,
    payment_date: Date,
    strike: f64,
    settlement: Settlement,
    notional: f64,
}

impl AveragePriceSwap {
    /// Creates a swap paying on the last fixing date.
    pub fn new(price_curve: impl Into<String>, fixing_dates: Vec<Date>, strike: f64) -> CurveResult<Self> {
        let Some(&last) = fixing_dates.last() else {
            return Err(CurveError::invalid_instrument("average price swap without fixing dates"));
        };
        if fixing_dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CurveError::invalid_instrument(
                "average price swap fixing dates must be strictly increasing",
            ));
        }
        Ok(Self {
            price_curve: price_curve.into(),
            fixing_dates,
            payment_date: last,
            strike,
            settlement: Settlement::default(),
            notional: 1.0,
        })
    }

    /// Discounts the payoff on an interest-rate curve.
    #[must_use]
    pub fn with_discount_curve(mut self, curve: impl Into<String>) -> Self {
        self.settlement.discount_curve = Some(curve.into());
        self
    }

    /// Converts the payoff from `from` into `to` at spot.
    #[must_use]
    pub fn with_fx(mut self, from: Currency, to: Currency) -> Self {
        self.settlement.fx = Some((from, to));
        self
    }

    /// Pays on `date` instead of the last fixing.
    #[must_use]
    pub fn with_payment_date(mut self, date: Date) -> Self {
        self.payment_date = date;
        self
    }

    /// Sets the notional.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Fixing dates.
    pub fn fixing_dates(&self) -> &[Date] {
        &self.fixing_dates
    }

    /// Average forward price over the fixings.
    pub fn average_price(&self, curves: &CurveSet) -> CurveResult<f64> {
        let mut sum = 0.0;
        for date in &self.fixing_dates {
            sum += curves.price(&self.price_curve, *date)?;
        }
        Ok(sum / self.fixing_dates.len() as f64)
    }
}

impl CalibrationInstrument for AveragePriceSwap {
    fn solve_curve(&self) -> &str {
        &self.price_curve
    }

    fn pillar_date(&self) -> Date {
        self.fixing_dates[self.fixing_dates.len() - 1]
    }

    fn pv(&self, curves: &CurveSet) -> CurveResult<f64> {
        let average = self.average_price(curves)?;
        let fx = self.settlement.fx_rate(curves)?;
        let (df, _) = self.settlement.discount(curves, self.payment_date)?;
        Ok(self.notional * fx * df * (average - self.strike))
    }

    fn has_analytic_sensitivities(&self) -> bool {
        true
    }

    fn sensitivities(&self, curves: &CurveSet) -> CurveResult<SensitivityMap> {
        let average = self.average_price(curves)?;
        let scale = self.notional * self.settlement.fx_rate(curves)?;
        let (df, ddf) = self.settlement.discount(curves, self.payment_date)?;
        let weight = scale * df / self.fixing_dates.len() as f64;

        let mut sens = SensitivityMap::new();
        let chain = curves.price_chain(&self.price_curve)?;
        for date in &self.fixing_dates {
            for curve in &chain {
                sens.add(curve, *date, weight);
            }
        }
        if let Some(curve) = &self.settlement.discount_curve {
            sens.add(curve, self.payment_date, scale * ddf * (average - self.strike));
        }
        Ok(sens)
    }

    fn curve_names(&self) -> Vec<&str> {
        let mut names = vec![self.price_curve.as_str()];
        names.extend(self.settlement.discount_curve.as_deref());
        names
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::AveragePriceSwap
    }

    fn description(&self) -> String {
        format!(
            "APS {} {}..{} @ {:.4}",
            self.price_curve,
            self.fixing_dates[0],
            self.pillar_date(),
            self.strike
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use approx::assert_relative_eq;
    use crate::market::FxMatrix;

    #[test]
    fn test_forward_on_basis_curve() {
        let curves = market();
        let delivery = d(2025, 6, 15);
        let fwd = AssetForward::new("WCS", delivery, 59.0);
        assert_relative_eq!(fwd.pv(&curves).unwrap(), 71.5 - 12.5 - 59.0, epsilon = 1e-12);
        assert_eq!(fwd.curve_names(), vec!["WCS"]);
    }

    #[test]
    fn test_forward_discount_and_fx() {
        let curves = market().with_fx(FxMatrix::new(Currency::USD).with_spot(Currency::CAD, 1.35).unwrap());
        let delivery = d(2025, 9, 15);
        let fwd = AssetForward::new("WTI", delivery, 70.0)
            .with_discount_curve("USD.OIS")
            .with_fx(Currency::USD, Currency::CAD);
        let df = curves.discount_factor("USD.OIS", delivery).unwrap();
        assert_relative_eq!(fwd.pv(&curves).unwrap(), 1.35 * df * 2.0, epsilon = 1e-12);
        assert_sensitivities_match(&curves, &fwd);
    }

    #[test]
    fn test_forward_sensitivities_through_basis() {
        let curves = market();
        let fwd = AssetForward::new("WCS", d(2025, 8, 1), 58.0)
            .with_discount_curve("USD.OIS")
            .with_notional(1000.0);
        assert_sensitivities_match(&curves, &fwd);
    }

    #[test]
    fn test_average_price_swap() {
        let curves = market();
        let fixings = vec![d(2025, 3, 15), d(2025, 6, 15), d(2025, 9, 15)];
        let aps = AveragePriceSwap::new("WTI", fixings, 71.0).unwrap();
        assert_relative_eq!(aps.average_price(&curves).unwrap(), (70.0 + 71.5 + 72.0) / 3.0, epsilon = 1e-12);
        assert_eq!(aps.pillar_date(), d(2025, 9, 15));

        let discounted = aps.clone().with_discount_curve("USD.OIS").with_payment_date(d(2025, 10, 5));
        assert_sensitivities_match(&curves, &discounted);

        let on_basis = AveragePriceSwap::new("WCS", vec![d(2025, 4, 1), d(2025, 5, 1), d(2025, 11, 1)], 60.0).unwrap();
        assert_sensitivities_match(&curves, &on_basis);
    }

    #[test]
    fn test_average_price_swap_validation() {
        assert!(AveragePriceSwap::new("WTI", vec![], 70.0).is_err());
        assert!(AveragePriceSwap::new("WTI", vec![d(2025, 6, 1), d(2025, 5, 1)], 70.0).is_err());
    }
}
