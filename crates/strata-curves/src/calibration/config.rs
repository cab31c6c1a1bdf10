//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// Default convergence tolerance on max |PV|.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Default pillar bump for the numerical Jacobian.
pub const DEFAULT_BUMP: f64 = 1e-4;

/// Default Newton iteration budget per stage.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// How the Newton Jacobian is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JacobianMethod {
    /// Bump each pillar, reprice, finite-difference.
    #[default]
    Numerical,
    /// Project instrument sensitivities onto pillars.
    Analytic,
}

/// Configuration for the calibration solvers.
///
/// Tolerance and bump are absolute and apply to every instrument alike.
///
/// # Example
///
/// ```rust
/// use strata_curves::calibration::{CalibrationConfig, JacobianMethod};
///
/// let config = CalibrationConfig::from_toml_str(
///     r#"
///     tolerance = 1e-10
///     jacobian = "analytic"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.jacobian, JacobianMethod::Analytic);
/// assert_eq!(config.max_iterations, 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Stage converges once max |PV| falls below this.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Pillar bump for the numerical Jacobian.
    #[serde(default = "default_bump")]
    pub bump: f64,
    /// Newton iteration budget per stage.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Jacobian construction.
    #[serde(default)]
    pub jacobian: JacobianMethod,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_bump() -> f64 {
    DEFAULT_BUMP
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            bump: DEFAULT_BUMP,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            jacobian: JacobianMethod::Numerical,
        }
    }
}

impl CalibrationConfig {
    /// Defaults with a bump-and-revalue Jacobian.
    #[must_use]
    pub fn numerical() -> Self {
        Self::default()
    }

    /// Defaults with an analytic Jacobian.
    #[must_use]
    pub fn analytic() -> Self {
        Self::default().with_jacobian(JacobianMethod::Analytic)
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the bump size.
    #[must_use]
    pub fn with_bump(mut self, bump: f64) -> Self {
        self.bump = bump;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the Jacobian method.
    #[must_use]
    pub fn with_jacobian(mut self, jacobian: JacobianMethod) -> Self {
        self.jacobian = jacobian;
        self
    }

    /// Checks tolerance and bump are positive and the budget non-zero.
    pub fn validate(&self) -> CurveResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(CurveError::invalid_config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.bump.is_finite() && self.bump > 0.0) {
            return Err(CurveError::invalid_config(format!(
                "bump must be positive, got {}",
                self.bump
            )));
        }
        if self.max_iterations == 0 {
            return Err(CurveError::invalid_config("max_iterations must be at least 1"));
        }
        Ok(())
    }

    /// Parses and validates a TOML fragment; missing keys take defaults.
    pub fn from_toml_str(s: &str) -> CurveResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| CurveError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalibrationConfig::default();
        assert_eq!(config.tolerance, 1e-8);
        assert_eq!(config.bump, 1e-4);
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.jacobian, JacobianMethod::Numerical);
        assert_eq!(CalibrationConfig::analytic().jacobian, JacobianMethod::Analytic);
    }

    #[test]
    fn test_from_toml() {
        let config = CalibrationConfig::from_toml_str("max_iterations = 50\nbump = 1e-6").unwrap();
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.bump, 1e-6);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);

        assert!(CalibrationConfig::from_toml_str("").is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            CalibrationConfig::from_toml_str("tolerance = -1.0"),
            Err(CurveError::InvalidConfig { .. })
        ));
        assert!(CalibrationConfig::from_toml_str("max_iterations = 0").is_err());
        assert!(CalibrationConfig::from_toml_str("jacobian = \"secant\"").is_err());
        assert!(CalibrationConfig::default().with_bump(0.0).validate().is_err());
    }
}
