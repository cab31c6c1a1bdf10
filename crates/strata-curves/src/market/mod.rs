//! Market data aggregate.
//!
//! A [`CurveSet`] is the mutable container the solvers write into. Once
//! calibration finishes, [`CurveSet::freeze`] produces a [`FrozenCurveSet`]:
//! a cheap-to-share immutable snapshot for pricing.

mod curve_set;
mod fx;

pub use curve_set::{CurveSet, FrozenCurveSet};
pub use fx::FxMatrix;
