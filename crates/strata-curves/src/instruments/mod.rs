//! Calibration instruments.
//!
//! Each instrument contributes one PV equation to the stage of the curve it
//! calibrates (its *solve curve*). Instruments are immutable trade
//! definitions; their PV is a pure function of the curve set.
//!
//! # Available Instruments
//!
//! ## Rates
//! - [`Deposit`]: money market deposit
//! - [`Fra`]: forward rate agreement
//! - [`IrSwap`]: fixed-for-floating swap with separate forecast and discount curves
//! - [`BasisSwap`]: float-for-float swap with a spread on one leg
//!
//! ## Credit
//! - [`Cds`]: credit default swap on a hazard curve
//!
//! ## Commodities and assets
//! - [`AssetForward`]: forward on a price or basis price curve
//! - [`AveragePriceSwap`]: swap on the arithmetic average of forward prices
//!
//! # Sensitivities
//!
//! Instruments may also report analytic sensitivities: for each referenced
//! curve and date, the derivative of the PV with respect to the curve's
//! stored quantity at that date (zero rate, price, spread or hazard rate).
//! The analytic Jacobian projects these onto pillars through
//! [`PillarCurve::sensitivity`](crate::curves::PillarCurve::sensitivity).

mod asset;
mod basis_swap;
mod cds;
mod deposit;
mod fra;
mod schedule;
mod swap;

pub use asset::{AssetForward, AveragePriceSwap};
pub use basis_swap::BasisSwap;
pub use cds::Cds;
pub use deposit::Deposit;
pub use fra::Fra;
pub use schedule::generate_schedule;
pub use swap::IrSwap;

use std::collections::BTreeMap;
use std::fmt;

use strata_core::types::{Currency, Date};

use crate::error::{CurveError, CurveResult};
use crate::market::CurveSet;

/// Type of calibration instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentType {
    /// Cash deposit
    Deposit,
    /// Forward rate agreement
    Fra,
    /// Fixed-for-floating swap
    Swap,
    /// Float-for-float basis swap
    BasisSwap,
    /// Credit default swap
    Cds,
    /// Asset or commodity forward
    AssetForward,
    /// Average price swap
    AveragePriceSwap,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentType::Deposit => write!(f, "Deposit"),
            InstrumentType::Fra => write!(f, "FRA"),
            InstrumentType::Swap => write!(f, "Swap"),
            InstrumentType::BasisSwap => write!(f, "Basis Swap"),
            InstrumentType::Cds => write!(f, "CDS"),
            InstrumentType::AssetForward => write!(f, "Forward"),
            InstrumentType::AveragePriceSwap => write!(f, "APS"),
        }
    }
}

/// PV derivatives by curve name, then by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitivityMap(BTreeMap<String, BTreeMap<Date, f64>>);

impl SensitivityMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates `value` at `(curve, date)`.
    pub fn add(&mut self, curve: &str, date: Date, value: f64) {
        *self
            .0
            .entry(curve.to_string())
            .or_default()
            .entry(date)
            .or_insert(0.0) += value;
    }

    /// Entries for one curve.
    pub fn curve(&self, name: &str) -> Option<&BTreeMap<Date, f64>> {
        self.0.get(name)
    }

    /// Sensitivity at `(curve, date)`, zero when absent.
    pub fn get(&self, curve: &str, date: Date) -> f64 {
        self.0
            .get(curve)
            .and_then(|dates| dates.get(&date))
            .copied()
            .unwrap_or(0.0)
    }

    /// Curves in name order with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<Date, f64>)> {
        self.0.iter().map(|(name, dates)| (name.as_str(), dates))
    }

    /// Whether no sensitivity was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An instrument that can calibrate a curve.
pub trait CalibrationInstrument: Send + Sync + fmt::Debug {
    /// Name of the curve whose stage this instrument's equation belongs to.
    fn solve_curve(&self) -> &str;

    /// Date the instrument is most sensitive to; usually its maturity.
    fn pillar_date(&self) -> Date;

    /// PV against the current curves. Zero when the curves reprice the quote.
    fn pv(&self, curves: &CurveSet) -> CurveResult<f64>;

    /// Whether [`sensitivities`](Self::sensitivities) is implemented.
    fn has_analytic_sensitivities(&self) -> bool {
        false
    }

    /// Analytic PV derivatives by curve and date.
    fn sensitivities(&self, _curves: &CurveSet) -> CurveResult<SensitivityMap> {
        Err(CurveError::sensitivities_unavailable(self.description()))
    }

    /// Names of every curve the PV reads directly.
    fn curve_names(&self) -> Vec<&str>;

    /// Instrument type.
    fn instrument_type(&self) -> InstrumentType;

    /// Returns a description of the instrument for display.
    fn description(&self) -> String {
        format!(
            "{} {} {}",
            self.instrument_type(),
            self.solve_curve(),
            self.pillar_date()
        )
    }
}

/// Ordered collection of calibration instruments.
///
/// Input order is preserved; it fixes the row order of each stage's
/// equations.
#[derive(Debug, Default)]
pub struct InstrumentSet {
    instruments: Vec<Box<dyn CalibrationInstrument>>,
}

impl InstrumentSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instrument.
    pub fn add(&mut self, instrument: impl CalibrationInstrument + 'static) {
        self.instruments.push(Box::new(instrument));
    }

    /// Adds a boxed instrument.
    pub fn add_boxed(&mut self, instrument: Box<dyn CalibrationInstrument>) {
        self.instruments.push(instrument);
    }

    /// Adds an instrument in builder style.
    #[must_use]
    pub fn with(mut self, instrument: impl CalibrationInstrument + 'static) -> Self {
        self.add(instrument);
        self
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Instrument at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn CalibrationInstrument> {
        self.instruments.get(index).map(AsRef::as_ref)
    }

    /// Iterates in input order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn CalibrationInstrument> {
        self.instruments.iter().map(AsRef::as_ref)
    }

    /// Instruments calibrating `curve`, in input order.
    pub fn for_curve<'a>(&'a self, curve: &'a str) -> impl Iterator<Item = &'a dyn CalibrationInstrument> {
        self.iter().filter(move |i| i.solve_curve() == curve)
    }
}

impl FromIterator<Box<dyn CalibrationInstrument>> for InstrumentSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn CalibrationInstrument>>>(iter: I) -> Self {
        Self {
            instruments: iter.into_iter().collect(),
        }
    }
}

/// Discount factor and its derivative with respect to the zero rate at `date`.
pub(crate) fn discount_with_delta(curves: &CurveSet, curve: &str, date: Date) -> CurveResult<(f64, f64)> {
    let ir = curves.ir_curve(curve)?;
    let df = ir.discount_factor(date)?;
    Ok((df, -ir.time(date) * df))
}

/// Optional discounting and currency conversion shared by the asset instruments.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Settlement {
    pub(crate) discount_curve: Option<String>,
    pub(crate) fx: Option<(Currency, Currency)>,
}

impl Settlement {
    pub(crate) fn fx_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        match self.fx {
            Some((from, to)) => curves.fx_rate(from, to),
            None => Ok(1.0),
        }
    }

    /// Discount factor to `date` and its zero-rate derivative; `(1, 0)`
    /// without a discount curve.
    pub(crate) fn discount(&self, curves: &CurveSet, date: Date) -> CurveResult<(f64, f64)> {
        match &self.discount_curve {
            Some(curve) => discount_with_delta(curves, curve, date),
            None => Ok((1.0, 0.0)),
        }
    }
}
