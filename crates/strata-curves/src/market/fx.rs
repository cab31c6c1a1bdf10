//! FX spot matrix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_core::types::Currency;

use crate::error::{CurveError, CurveResult};

/// Spot FX quotes against a single base currency.
///
/// Each quote is the number of units of a currency per one unit of the
/// base; cross rates go through the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxMatrix {
    base: Currency,
    spots: BTreeMap<Currency, f64>,
}

impl Default for FxMatrix {
    fn default() -> Self {
        Self::new(Currency::USD)
    }
}

impl FxMatrix {
    /// Creates an empty matrix with the given base currency.
    #[must_use]
    pub fn new(base: Currency) -> Self {
        Self {
            base,
            spots: BTreeMap::new(),
        }
    }

    /// Base currency.
    pub fn base(&self) -> Currency {
        self.base
    }

    /// Adds a spot quote (units of `currency` per unit of base).
    pub fn with_spot(mut self, currency: Currency, units_per_base: f64) -> CurveResult<Self> {
        self.set_spot(currency, units_per_base)?;
        Ok(self)
    }

    /// Inserts or replaces a spot quote.
    pub fn set_spot(&mut self, currency: Currency, units_per_base: f64) -> CurveResult<()> {
        if !(units_per_base.is_finite() && units_per_base > 0.0) {
            return Err(CurveError::invalid_value(format!(
                "FX spot {}/{currency} must be positive, got {units_per_base}",
                self.base
            )));
        }
        self.spots.insert(currency, units_per_base);
        Ok(())
    }

    fn units_per_base(&self, currency: Currency) -> Option<f64> {
        if currency == self.base {
            Some(1.0)
        } else {
            self.spots.get(&currency).copied()
        }
    }

    /// Units of `to` per one unit of `from`.
    pub fn rate(&self, from: Currency, to: Currency) -> CurveResult<f64> {
        if from == to {
            return Ok(1.0);
        }
        match (self.units_per_base(from), self.units_per_base(to)) {
            (Some(f), Some(t)) => Ok(t / f),
            _ => Err(CurveError::MissingFxRate { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_rates() {
        let fx = FxMatrix::new(Currency::USD)
            .with_spot(Currency::EUR, 0.9)
            .unwrap()
            .with_spot(Currency::JPY, 150.0)
            .unwrap();

        assert_relative_eq!(fx.rate(Currency::USD, Currency::EUR).unwrap(), 0.9);
        assert_relative_eq!(fx.rate(Currency::EUR, Currency::USD).unwrap(), 1.0 / 0.9);
        assert_relative_eq!(fx.rate(Currency::EUR, Currency::JPY).unwrap(), 150.0 / 0.9);
        assert_relative_eq!(fx.rate(Currency::GBP, Currency::GBP).unwrap(), 1.0);
        assert!(matches!(
            fx.rate(Currency::GBP, Currency::USD),
            Err(CurveError::MissingFxRate { .. })
        ));
        assert!(FxMatrix::default().with_spot(Currency::EUR, -1.0).is_err());
    }
}
