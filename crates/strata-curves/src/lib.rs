//! # Strata Curves
//!
//! Staged multi-curve calibration for the Strata library.
//!
//! This crate provides:
//!
//! - **Curves**: pillar curves for interest rates, commodity/asset prices,
//!   basis spreads over a price curve and credit hazard rates
//! - **Market**: the [`CurveSet`] aggregate (named curves, FX matrix, vol
//!   surfaces) and its frozen snapshot
//! - **Instruments**: deposits, FRAs, swaps, basis swaps, CDS, asset forwards
//!   and average-price swaps, each contributing one PV equation
//! - **Calibration**: stage partitioning and Newton-Raphson solvers with
//!   bump-and-revalue or analytic Jacobians
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata_curves::prelude::*;
//!
//! let build = Date::from_ymd(2025, 1, 15)?;
//! let mut curves = CurveSet::new(build).with_curve(
//!     IrCurve::new("USD.LIBOR", build, vec![build.add_months(3)?], vec![0.05])?,
//! )?;
//!
//! let instruments = InstrumentSet::new()
//!     .with(Deposit::new("USD.LIBOR", build, build.add_months(3)?, 0.06));
//!
//! let mut solver = MultiCurveSolver::numerical();
//! let report = solver.solve(&mut curves, &instruments)?;
//! assert!(report.is_converged());
//!
//! let frozen = curves.freeze();
//! let df = frozen.discount_factor("USD.LIBOR", build.add_months(3)?)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod calibration;
pub mod curves;
pub mod error;
pub mod instruments;
pub mod market;
pub mod repricing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calibration::{
        CalibrationConfig, CalibrationReport, JacobianMethod, MultiCurveSolver, SingleCurveSolver,
        SolveStatus, SolvedCurve, StagePartition, StageReport,
    };
    pub use crate::curves::{
        BasisPriceCurve, CurveKind, HazardCurve, IrCurve, MarketCurve, PillarCurve, PriceCurve,
    };
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::instruments::{
        AssetForward, AveragePriceSwap, BasisSwap, CalibrationInstrument, Cds, Deposit, Fra,
        InstrumentSet, InstrumentType, IrSwap, SensitivityMap,
    };
    pub use crate::market::{CurveSet, FrozenCurveSet, FxMatrix};
    pub use crate::repricing::{reprice, RepricingCheck, RepricingReport};
    pub use strata_core::prelude::*;
}

pub use calibration::{MultiCurveSolver, SingleCurveSolver, SolveStatus};
pub use curves::{MarketCurve, PillarCurve};
pub use error::{CurveError, CurveResult};
pub use market::{CurveSet, FrozenCurveSet};
