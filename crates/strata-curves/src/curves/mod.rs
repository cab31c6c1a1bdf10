//! Pillar curves.
//!
//! Every calibrated curve is an ordered set of `(pillar date, pillar value)`
//! pairs plus an interpolation rule. The value stored at a pillar depends on
//! the curve kind:
//!
//! | Curve               | Pillar value                          |
//! |---------------------|---------------------------------------|
//! | [`IrCurve`]         | continuously-compounded zero rate     |
//! | [`PriceCurve`]      | forward price                         |
//! | [`BasisPriceCurve`] | spread over a named base price curve  |
//! | [`HazardCurve`]     | zero hazard rate                      |
//!
//! The [`PillarCurve`] trait is the contract the calibration engine relies
//! on: read, write and bump a pillar by index, and query the per-pillar
//! weights of the interpolated value at a date.

mod basis;
mod hazard;
mod ir;
mod pillars;
mod price;

pub use basis::BasisPriceCurve;
pub use hazard::HazardCurve;
pub use ir::IrCurve;
pub use pillars::Pillars;
pub use price::PriceCurve;

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::types::Date;

use crate::error::{CurveError, CurveResult};

/// The kind of a market curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveKind {
    /// Interest-rate discount/forecast curve.
    InterestRate,
    /// Commodity or asset forward price curve.
    Price,
    /// Spread over a base price curve.
    BasisPrice,
    /// Credit hazard-rate curve.
    Hazard,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurveKind::InterestRate => "interest rate",
            CurveKind::Price => "price",
            CurveKind::BasisPrice => "basis price",
            CurveKind::Hazard => "hazard",
        };
        write!(f, "{name}")
    }
}

/// Contract a curve satisfies to take part in calibration.
pub trait PillarCurve: Send + Sync + fmt::Debug {
    /// Curve name, unique within a curve set.
    fn name(&self) -> &str;

    /// Kind of curve.
    fn kind(&self) -> CurveKind;

    /// Calibration stage; lower stages solve first.
    fn solve_stage(&self) -> u32;

    /// Date from which curve time is measured.
    fn build_date(&self) -> Date;

    /// Number of pillars.
    fn number_of_pillars(&self) -> usize {
        self.pillar_dates().len()
    }

    /// Pillar dates, strictly increasing.
    fn pillar_dates(&self) -> &[Date];

    /// All pillar values.
    fn rates(&self) -> &[f64];

    /// Value of one pillar.
    fn rate(&self, pillar: usize) -> CurveResult<f64>;

    /// Overwrites one pillar; drops any cached interpolant.
    fn set_rate(&mut self, pillar: usize, value: f64) -> CurveResult<()>;

    /// Adds `delta` to one pillar; drops any cached interpolant.
    fn bump_rate(&mut self, pillar: usize, delta: f64) -> CurveResult<()> {
        let value = self.rate(pillar)?;
        self.set_rate(pillar, value + delta)
    }

    /// Interpolated pillar quantity at `date`.
    fn value_at(&self, date: Date) -> CurveResult<f64>;

    /// Weights `w` with `d value_at(date) / d pillar[i] = w[i]`.
    fn sensitivity(&self, date: Date) -> CurveResult<Vec<f64>>;
}

/// Implements [`PillarCurve`] and the shared builder methods by delegating
/// to the curve's `pillars` field.
macro_rules! delegate_pillar_curve {
    ($ty:ty, $kind:expr) => {
        impl $ty {
            /// Sets the calibration stage.
            #[must_use]
            pub fn with_solve_stage(mut self, stage: u32) -> Self {
                self.pillars.set_solve_stage(stage);
                self
            }

            /// Sets the interpolation method.
            #[must_use]
            pub fn with_interpolation(mut self, kind: strata_math::interpolation::InterpolatorKind) -> Self {
                self.pillars.set_interpolation(kind);
                self
            }

            /// Sets the extrapolation policy.
            #[must_use]
            pub fn with_extrapolation(mut self, extrapolation: strata_math::interpolation::Extrapolation) -> Self {
                self.pillars.set_extrapolation(extrapolation);
                self
            }

            /// The underlying pillar storage.
            #[must_use]
            pub fn pillars(&self) -> &$crate::curves::Pillars {
                &self.pillars
            }
        }

        impl $crate::curves::PillarCurve for $ty {
            fn name(&self) -> &str {
                self.pillars.name()
            }

            fn kind(&self) -> $crate::curves::CurveKind {
                $kind
            }

            fn solve_stage(&self) -> u32 {
                self.pillars.solve_stage()
            }

            fn build_date(&self) -> strata_core::types::Date {
                self.pillars.build_date()
            }

            fn pillar_dates(&self) -> &[strata_core::types::Date] {
                self.pillars.dates()
            }

            fn rates(&self) -> &[f64] {
                self.pillars.values()
            }

            fn rate(&self, pillar: usize) -> $crate::error::CurveResult<f64> {
                self.pillars.get(pillar)
            }

            fn set_rate(&mut self, pillar: usize, value: f64) -> $crate::error::CurveResult<()> {
                self.pillars.set(pillar, value)
            }

            fn value_at(&self, date: strata_core::types::Date) -> $crate::error::CurveResult<f64> {
                self.pillars.value_at(date)
            }

            fn sensitivity(&self, date: strata_core::types::Date) -> $crate::error::CurveResult<Vec<f64>> {
                self.pillars.sensitivity(date)
            }
        }
    };
}

pub(crate) use delegate_pillar_curve;

/// Any curve that can live in a [`CurveSet`](crate::market::CurveSet).
#[derive(Debug, Clone)]
pub enum MarketCurve {
    /// Interest-rate curve.
    Ir(IrCurve),
    /// Price curve.
    Price(PriceCurve),
    /// Basis price curve.
    BasisPrice(BasisPriceCurve),
    /// Hazard curve.
    Hazard(HazardCurve),
}

impl MarketCurve {
    fn pillars(&self) -> &Pillars {
        match self {
            MarketCurve::Ir(c) => c.pillars(),
            MarketCurve::Price(c) => c.pillars(),
            MarketCurve::BasisPrice(c) => c.pillars(),
            MarketCurve::Hazard(c) => c.pillars(),
        }
    }

    fn as_pillar_curve_mut(&mut self) -> &mut dyn PillarCurve {
        match self {
            MarketCurve::Ir(c) => c,
            MarketCurve::Price(c) => c,
            MarketCurve::BasisPrice(c) => c,
            MarketCurve::Hazard(c) => c,
        }
    }

    fn wrong_kind(&self, expected: CurveKind) -> CurveError {
        CurveError::wrong_kind(self.name(), expected.to_string(), self.kind().to_string())
    }

    /// The interest-rate curve, if this is one.
    pub fn as_ir(&self) -> CurveResult<&IrCurve> {
        match self {
            MarketCurve::Ir(c) => Ok(c),
            _ => Err(self.wrong_kind(CurveKind::InterestRate)),
        }
    }

    /// The price curve, if this is one.
    pub fn as_price(&self) -> CurveResult<&PriceCurve> {
        match self {
            MarketCurve::Price(c) => Ok(c),
            _ => Err(self.wrong_kind(CurveKind::Price)),
        }
    }

    /// The basis price curve, if this is one.
    pub fn as_basis(&self) -> CurveResult<&BasisPriceCurve> {
        match self {
            MarketCurve::BasisPrice(c) => Ok(c),
            _ => Err(self.wrong_kind(CurveKind::BasisPrice)),
        }
    }

    /// The hazard curve, if this is one.
    pub fn as_hazard(&self) -> CurveResult<&HazardCurve> {
        match self {
            MarketCurve::Hazard(c) => Ok(c),
            _ => Err(self.wrong_kind(CurveKind::Hazard)),
        }
    }

    /// Unwraps an interest-rate curve.
    pub fn into_ir(self) -> CurveResult<IrCurve> {
        match self {
            MarketCurve::Ir(c) => Ok(c),
            other => Err(other.wrong_kind(CurveKind::InterestRate)),
        }
    }

    /// Unwraps a price curve.
    pub fn into_price(self) -> CurveResult<PriceCurve> {
        match self {
            MarketCurve::Price(c) => Ok(c),
            other => Err(other.wrong_kind(CurveKind::Price)),
        }
    }

    /// Unwraps a basis price curve.
    pub fn into_basis(self) -> CurveResult<BasisPriceCurve> {
        match self {
            MarketCurve::BasisPrice(c) => Ok(c),
            other => Err(other.wrong_kind(CurveKind::BasisPrice)),
        }
    }

    /// Unwraps a hazard curve.
    pub fn into_hazard(self) -> CurveResult<HazardCurve> {
        match self {
            MarketCurve::Hazard(c) => Ok(c),
            other => Err(other.wrong_kind(CurveKind::Hazard)),
        }
    }
}

impl PillarCurve for MarketCurve {
    fn name(&self) -> &str {
        self.pillars().name()
    }

    fn kind(&self) -> CurveKind {
        match self {
            MarketCurve::Ir(_) => CurveKind::InterestRate,
            MarketCurve::Price(_) => CurveKind::Price,
            MarketCurve::BasisPrice(_) => CurveKind::BasisPrice,
            MarketCurve::Hazard(_) => CurveKind::Hazard,
        }
    }

    fn solve_stage(&self) -> u32 {
        self.pillars().solve_stage()
    }

    fn build_date(&self) -> Date {
        self.pillars().build_date()
    }

    fn pillar_dates(&self) -> &[Date] {
        self.pillars().dates()
    }

    fn rates(&self) -> &[f64] {
        self.pillars().values()
    }

    fn rate(&self, pillar: usize) -> CurveResult<f64> {
        self.pillars().get(pillar)
    }

    fn set_rate(&mut self, pillar: usize, value: f64) -> CurveResult<()> {
        self.as_pillar_curve_mut().set_rate(pillar, value)
    }

    fn value_at(&self, date: Date) -> CurveResult<f64> {
        self.pillars().value_at(date)
    }

    fn sensitivity(&self, date: Date) -> CurveResult<Vec<f64>> {
        self.pillars().sensitivity(date)
    }
}

impl From<IrCurve> for MarketCurve {
    fn from(curve: IrCurve) -> Self {
        MarketCurve::Ir(curve)
    }
}

impl From<PriceCurve> for MarketCurve {
    fn from(curve: PriceCurve) -> Self {
        MarketCurve::Price(curve)
    }
}

impl From<BasisPriceCurve> for MarketCurve {
    fn from(curve: BasisPriceCurve) -> Self {
        MarketCurve::BasisPrice(curve)
    }
}

impl From<HazardCurve> for MarketCurve {
    fn from(curve: HazardCurve) -> Self {
        MarketCurve::Hazard(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_market_curve_dispatch() {
        let build = d(2025, 1, 15);
        let mut curve: MarketCurve = IrCurve::new("USD", build, vec![d(2025, 4, 15), d(2026, 1, 15)], vec![0.04, 0.05])
            .unwrap()
            .with_solve_stage(2)
            .into();

        assert_eq!(curve.kind(), CurveKind::InterestRate);
        assert_eq!(curve.solve_stage(), 2);
        assert_eq!(curve.number_of_pillars(), 2);

        curve.bump_rate(1, 0.01).unwrap();
        assert!((curve.rate(1).unwrap() - 0.06).abs() < 1e-15);
        assert!(curve.as_ir().is_ok());
        assert!(matches!(curve.as_price(), Err(CurveError::WrongCurveKind { .. })));
        assert!(curve.into_hazard().is_err());
    }
}
