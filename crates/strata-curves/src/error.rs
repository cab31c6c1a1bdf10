//! Error types for curve construction and calibration.
//!
//! Configuration problems (unknown curves, non-square stages, instruments
//! that cannot supply analytic sensitivities) are errors raised before any
//! Newton iteration runs. Numerical non-convergence is not an error: it is
//! reported through [`SolveStatus`](crate::calibration::SolveStatus) and only
//! becomes [`CurveError::NotConverged`] when the caller opts in with
//! [`CalibrationReport::into_result`](crate::calibration::CalibrationReport::into_result).

use strata_core::types::{Currency, Date};
use strata_core::CoreError;
use strata_math::MathError;
use thiserror::Error;

use crate::calibration::SolveStatus;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// No curve with this name in the curve set.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Name of the missing curve.
        name: String,
    },

    /// A curve with this name is already in the set.
    #[error("Duplicate curve: {name}")]
    DuplicateCurve {
        /// Name of the curve.
        name: String,
    },

    /// Curve exists but is of another kind than the query needs.
    #[error("Curve '{name}' is a {found} curve, expected {expected}")]
    WrongCurveKind {
        /// Curve name.
        name: String,
        /// Kind required by the caller.
        expected: String,
        /// Kind actually stored.
        found: String,
    },

    /// Curve build date differs from the curve set's.
    #[error("Curve '{name}' built on {got}, curve set built on {expected}")]
    BuildDateMismatch {
        /// Curve name.
        name: String,
        /// Curve set build date.
        expected: Date,
        /// Curve build date.
        got: Date,
    },

    /// Number of pillars in a stage differs from the number of instruments.
    #[error("Stage {stage}: {pillars} pillars but {instruments} instruments")]
    StageMismatch {
        /// Stage index.
        stage: u32,
        /// Total pillars across the stage's curves.
        pillars: usize,
        /// Instruments calibrating the stage.
        instruments: usize,
    },

    /// An instrument depends on a curve solved in a later stage.
    #[error(
        "Instrument '{instrument}' (stage {instrument_stage}) references curve '{curve}' solved in later stage {curve_stage}"
    )]
    StageOrderViolation {
        /// Instrument description.
        instrument: String,
        /// Referenced curve.
        curve: String,
        /// Stage the instrument calibrates.
        instrument_stage: u32,
        /// Stage of the referenced curve.
        curve_stage: u32,
    },

    /// Instrument cannot supply analytic sensitivities.
    #[error("Analytic sensitivities unavailable for '{instrument}'")]
    SensitivitiesUnavailable {
        /// Instrument description.
        instrument: String,
    },

    /// Pillar index out of range.
    #[error("Pillar {index} out of range for curve '{curve}' with {len} pillars")]
    PillarOutOfRange {
        /// Curve name.
        curve: String,
        /// Requested index.
        index: usize,
        /// Number of pillars.
        len: usize,
    },

    /// Pillar dates not strictly increasing.
    #[error("Non-monotonic pillars on curve '{curve}' at index {index}: {prev} >= {current}")]
    NonMonotonicPillars {
        /// Curve name.
        curve: String,
        /// Index of the offending pillar.
        index: usize,
        /// Previous pillar date.
        prev: Date,
        /// Current pillar date.
        current: Date,
    },

    /// Not enough pillars.
    #[error("Curve '{curve}' needs at least {required} pillars, got {got}")]
    InsufficientPillars {
        /// Curve name.
        curve: String,
        /// Minimum required.
        required: usize,
        /// Provided.
        got: usize,
    },

    /// Basis curves refer to each other in a loop.
    #[error("Basis curve cycle through '{curve}'")]
    BasisCycle {
        /// Curve where the cycle was detected.
        curve: String,
    },

    /// No spot quote linking two currencies.
    #[error("No FX rate for {from}/{to}")]
    MissingFxRate {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
    },

    /// No volatility surface with this name.
    #[error("Volatility surface not found: {name}")]
    VolSurfaceNotFound {
        /// Surface name.
        name: String,
    },

    /// Invalid instrument definition.
    #[error("Invalid instrument: {reason}")]
    InvalidInstrument {
        /// Description of the problem.
        reason: String,
    },

    /// Invalid numeric value.
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of the problem.
        reason: String,
    },

    /// Invalid solver configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Calibration did not converge (raised only on request).
    #[error("Calibration {status:?} after {iterations} iterations (max |PV|: {max_abs_pv:.2e})")]
    NotConverged {
        /// Final status.
        status: SolveStatus,
        /// Iterations used by the worst stage.
        iterations: u32,
        /// Largest residual PV.
        max_abs_pv: f64,
    },

    /// Error from the math layer.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error from the core date services.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CurveError {
    /// Creates a curve not found error.
    #[must_use]
    pub fn curve_not_found(name: impl Into<String>) -> Self {
        Self::CurveNotFound { name: name.into() }
    }

    /// Creates a wrong curve kind error.
    #[must_use]
    pub fn wrong_kind(name: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::WrongCurveKind {
            name: name.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a stage mismatch error.
    #[must_use]
    pub fn stage_mismatch(stage: u32, pillars: usize, instruments: usize) -> Self {
        Self::StageMismatch {
            stage,
            pillars,
            instruments,
        }
    }

    /// Creates a sensitivities unavailable error.
    #[must_use]
    pub fn sensitivities_unavailable(instrument: impl Into<String>) -> Self {
        Self::SensitivitiesUnavailable {
            instrument: instrument.into(),
        }
    }

    /// Creates an invalid instrument error.
    #[must_use]
    pub fn invalid_instrument(reason: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether this error describes a configuration problem detected before iterating.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::CurveNotFound { .. }
                | Self::DuplicateCurve { .. }
                | Self::WrongCurveKind { .. }
                | Self::BuildDateMismatch { .. }
                | Self::StageMismatch { .. }
                | Self::StageOrderViolation { .. }
                | Self::SensitivitiesUnavailable { .. }
                | Self::InvalidConfig { .. }
                | Self::InvalidInstrument { .. }
        )
    }
}
