//! Basis price curve.

use strata_core::types::Date;

use super::{delegate_pillar_curve, CurveKind, Pillars};
use crate::error::CurveResult;

/// Prices expressed as a spread over another price curve.
///
/// The pillars hold spreads; the price at a date is the base curve's price
/// plus the interpolated spread. Resolving the base needs the enclosing
/// [`CurveSet`](crate::market::CurveSet), see
/// [`CurveSet::price`](crate::market::CurveSet::price).
#[derive(Debug, Clone)]
pub struct BasisPriceCurve {
    pub(crate) pillars: Pillars,
    base_curve: String,
}

impl BasisPriceCurve {
    /// Creates a basis curve over `base_curve`.
    pub fn new(
        name: impl Into<String>,
        base_curve: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        spreads: Vec<f64>,
    ) -> CurveResult<Self> {
        Ok(Self {
            pillars: Pillars::new(name, build_date, dates, spreads)?,
            base_curve: base_curve.into(),
        })
    }

    /// Name of the base price curve.
    pub fn base_curve(&self) -> &str {
        &self.base_curve
    }

    /// Spread over the base at `date`.
    pub fn spread(&self, date: Date) -> CurveResult<f64> {
        self.pillars.value_at(date)
    }
}

delegate_pillar_curve!(BasisPriceCurve, CurveKind::BasisPrice);
