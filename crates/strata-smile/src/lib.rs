//! # Strata Smile
//!
//! Volatility smiles from delta-quoted market data.
//!
//! This crate provides:
//!
//! - **Black**: forward option values, vega, forward and premium-adjusted
//!   deltas and their inversion to strikes
//! - **Quotes**: ATM vol plus risk reversals and butterflies at a set of
//!   deltas
//! - **Interpolated smiles**: a vol per quoted strike, solved in closed form
//!   for simple flies and by Newton iteration for market strangles
//! - **SABR**: Hagan's lognormal expansion and a fit of (alpha, rho, nu) at
//!   fixed beta
//!
//! Both fitted smiles implement [`strata_core::traits::VolSurface`], so they
//! can be stored on a curve set.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_smile::prelude::*;
//!
//! let spec = SmileSpec::new(1.10, 0.5, 0.32)
//!     .with_quote(SmileQuote::new(0.25, 0.02, 0.005));
//!
//! let mut solver = SmileSolver::default();
//! let smile = solver.solve("EURUSD.6M", &spec).unwrap();
//!
//! assert_eq!(smile.vols().len(), 3);
//! assert!((smile.vols()[1] - 0.32).abs() < 1e-12);
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
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod black;
pub mod error;
pub mod interpolated;
pub mod quotes;
pub mod sabr;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::black::{
        atm_strike, black_forward_value, black_vega, forward_delta, strike_from_delta, AtmConvention,
        DeltaType, OptionType,
    };
    pub use crate::error::{SmileError, SmileResult};
    pub use crate::interpolated::{InterpolatedSmile, SmileSolver, SmileSolverConfig};
    pub use crate::quotes::{FlyQuoting, SmileQuote, SmileSpec};
    pub use crate::sabr::{SabrConfig, SabrFitMethod, SabrParameters, SabrSmile, SabrSolver};
    pub use strata_core::traits::VolSurface;
}

pub use error::{SmileError, SmileResult};
