//! # Strata Math
//!
//! Numerical building blocks for the Strata calibration library.
//!
//! This crate provides:
//!
//! - **Interpolation**: value, derivative and per-knot sensitivity vectors
//! - **Linear Algebra**: LU-based linear solves and dense helpers
//! - **Solvers**: one-dimensional root finding (Brent)
//! - **Optimization**: Nelder-Mead (via `argmin`) and Gauss-Newton least squares
//! - **Distributions**: standard normal density, CDF and inverse CDF

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_range_loop)]

pub mod distributions;
pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod optimization;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::distributions::{norm_cdf, norm_inv_cdf, norm_pdf};
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{
        CubicSpline, Extrapolation, Interpolator, InterpolatorKind, LinearInterpolator,
        LogLinearInterpolator,
    };
    pub use crate::linear_algebra::{invert, matrix_product, solve_linear_system, solve_tridiagonal};
    pub use crate::optimization::{
        gauss_newton, nelder_mead, OptimizationConfig, OptimizationResult,
    };
    pub use crate::solvers::{brent, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};
