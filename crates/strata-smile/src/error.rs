//! Error types for smile construction and calibration.

use strata_core::CoreError;
use strata_math::MathError;
use thiserror::Error;

/// A specialized Result type for smile operations.
pub type SmileResult<T> = Result<T, SmileError>;

/// Error types for smile operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmileError {
    /// A market quote is unusable.
    #[error("Invalid quote: {reason}")]
    InvalidQuote {
        /// Description of the problem.
        reason: String,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// A solved value is NaN or infinite.
    #[error("Non-finite {what} after {iterations} iterations")]
    NonFinite {
        /// Which value went non-finite.
        what: String,
        /// Iterations completed.
        iterations: u32,
    },

    /// The smile Newton loop ran out of iterations.
    #[error("Smile solve did not converge after {iterations} iterations (residual: {residual:.2e})")]
    NotConverged {
        /// Iterations used.
        iterations: u32,
        /// Largest residual at exit.
        residual: f64,
    },

    /// The SABR fit ended outside the admissible parameter region.
    #[error("Infeasible SABR parameters: {reason}")]
    Infeasible {
        /// Description of the violation.
        reason: String,
    },

    /// Error from the math layer.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error from the core services.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SmileError {
    /// Creates an invalid quote error.
    #[must_use]
    pub fn invalid_quote(reason: impl Into<String>) -> Self {
        Self::InvalidQuote { reason: reason.into() }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(what: impl Into<String>, iterations: u32) -> Self {
        Self::NonFinite {
            what: what.into(),
            iterations,
        }
    }

    /// Creates an infeasible parameters error.
    #[must_use]
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SmileError::non_finite("vols", 3);
        assert_eq!(err.to_string(), "Non-finite vols after 3 iterations");

        let err: SmileError = MathError::SingularMatrix.into();
        assert_eq!(err.to_string(), "Singular matrix: cannot solve");
    }
}
