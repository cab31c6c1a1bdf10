//! SABR smiles and their calibration.
//!
//! SABR models the forward as a CEV process with stochastic vol:
//!
//! ```text
//! dF = σ F^β dW₁
//! dσ = ν σ dW₂
//! dW₁ dW₂ = ρ dt
//! ```
//!
//! Implied vols use Hagan's lognormal expansion. The calibrator fits
//! `(α, ρ, ν)` at a fixed β by minimising squared forward-value errors over
//! the quoted strikes, optionally divided by vega so that errors are in
//! vol units.
//!
//! # References
//! - Hagan, P. et al. "Managing Smile Risk" (2002)

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use strata_core::traits::VolSurface;
use strata_math::interpolation::InterpolatorKind;
use strata_math::optimization::{gauss_newton, nelder_mead, OptimizationConfig};
use tracing::{info, warn};

use crate::black::{black_forward_value, black_vega, OptionType};
use crate::error::{SmileError, SmileResult};
use crate::interpolated::{SmileSolver, SmileSolverConfig};
use crate::quotes::SmileSpec;

/// Error inflation applied outside the admissible parameter region.
pub const PENALTY: f64 = 1e10;

/// SABR parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SabrParameters {
    /// Vol level α > 0.
    pub alpha: f64,
    /// CEV exponent β ∈ \[0, 1\].
    pub beta: f64,
    /// Spot-vol correlation ρ ∈ (−1, 1).
    pub rho: f64,
    /// Vol of vol ν ≥ 0.
    pub nu: f64,
}

impl SabrParameters {
    /// Creates parameters, rejecting values outside the admissible region.
    pub fn new(alpha: f64, beta: f64, rho: f64, nu: f64) -> SmileResult<Self> {
        let params = Self { alpha, beta, rho, nu };
        if !params.is_feasible() {
            return Err(SmileError::infeasible(format!(
                "alpha {alpha}, beta {beta}, rho {rho}, nu {nu}"
            )));
        }
        Ok(params)
    }

    /// Whether the parameters lie in the admissible region.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.alpha > 0.0
            && self.nu >= 0.0
            && self.rho > -1.0
            && self.rho < 1.0
            && (0.0..=1.0).contains(&self.beta)
    }

    /// Nearest admissible parameters.
    #[must_use]
    pub fn projected(&self) -> Self {
        Self {
            alpha: self.alpha.max(1e-8),
            beta: self.beta.clamp(0.0, 1.0),
            rho: self.rho.clamp(-0.9999, 0.9999),
            nu: self.nu.max(0.0),
        }
    }

    /// Leading-order α reproducing an ATM vol.
    #[must_use]
    pub fn alpha_from_atm_vol(atm_vol: f64, forward: f64, beta: f64) -> f64 {
        atm_vol * forward.powf(1.0 - beta)
    }

    /// Hagan lognormal implied vol.
    #[must_use]
    pub fn implied_vol(&self, forward: f64, strike: f64, expiry: f64) -> f64 {
        if forward <= 0.0 || strike <= 0.0 {
            return f64::NAN;
        }
        let Self { alpha, beta, rho, nu } = *self;
        let omb = 1.0 - beta;

        let fk_omb = (forward * strike).powf(omb);
        let fk_half = fk_omb.sqrt();
        let log_fk = (forward / strike).ln();
        let log_fk2 = log_fk * log_fk;

        let time_factor = 1.0
            + (omb * omb / 24.0 * alpha * alpha / fk_omb
                + 0.25 * rho * beta * nu * alpha / fk_half
                + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu)
                * expiry;
        let denominator = fk_half * (1.0 + omb * omb / 24.0 * log_fk2 + omb.powi(4) / 1920.0 * log_fk2 * log_fk2);
        let z = nu / alpha * fk_half * log_fk;

        alpha / denominator * z_over_x(z, rho) * time_factor
    }
}

fn z_over_x(z: f64, rho: f64) -> f64 {
    if z.abs() < 1e-8 {
        1.0 - 0.5 * rho * z + (2.0 - 3.0 * rho * rho) / 12.0 * z * z
    } else {
        let x = (((1.0 - 2.0 * rho * z + z * z).sqrt() + z - rho) / (1.0 - rho)).ln();
        z / x
    }
}

/// A SABR smile for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SabrSmile {
    name: String,
    forward: f64,
    expiry: f64,
    params: SabrParameters,
}

impl SabrSmile {
    /// Creates a smile.
    #[must_use]
    pub fn new(name: impl Into<String>, forward: f64, expiry: f64, params: SabrParameters) -> Self {
        Self {
            name: name.into(),
            forward,
            expiry,
            params,
        }
    }

    /// Fitted parameters.
    pub fn params(&self) -> &SabrParameters {
        &self.params
    }

    /// Forward.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Time to expiry in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Vol at `strike`.
    pub fn vol(&self, strike: f64) -> f64 {
        self.params.implied_vol(self.forward, strike, self.expiry)
    }
}

impl VolSurface for SabrSmile {
    fn name(&self) -> &str {
        &self.name
    }

    fn volatility(&self, strike: f64, _expiry: f64) -> f64 {
        self.vol(strike)
    }
}

/// Minimiser used by [`SabrSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SabrFitMethod {
    /// Derivative-free simplex search.
    #[default]
    NelderMead,
    /// Gauss-Newton least squares.
    GaussNewton,
}

fn default_beta() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    1e-16
}

fn default_max_iterations() -> u32 {
    5000
}

/// SABR calibration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SabrConfig {
    /// Fixed β.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Minimiser.
    #[serde(default)]
    pub method: SabrFitMethod,
    /// Divide forward-value errors by vega.
    #[serde(default)]
    pub vega_weighted: bool,
    /// Optimiser tolerance.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Optimiser iteration budget.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for SabrConfig {
    fn default() -> Self {
        Self {
            beta: default_beta(),
            method: SabrFitMethod::default(),
            vega_weighted: false,
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl SabrConfig {
    /// Sets β.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the minimiser.
    #[must_use]
    pub fn with_method(mut self, method: SabrFitMethod) -> Self {
        self.method = method;
        self
    }

    /// Turns vega weighting on or off.
    #[must_use]
    pub fn with_vega_weighting(mut self, vega_weighted: bool) -> Self {
        self.vega_weighted = vega_weighted;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// One strike to reprice.
struct FitTarget {
    strike: f64,
    option: OptionType,
    value: f64,
    weight: f64,
}

/// Fitting problem over `x = [α, ρ, ν]`.
struct SabrProblem {
    forward: f64,
    expiry: f64,
    beta: f64,
    targets: Vec<FitTarget>,
    penalised: Cell<u32>,
}

impl SabrProblem {
    fn params(&self, x: &[f64]) -> SabrParameters {
        SabrParameters {
            alpha: x[0],
            beta: self.beta,
            rho: x[1],
            nu: x[2],
        }
    }

    /// Weighted errors at the nearest admissible point, and whether `x` was admissible.
    fn errors(&self, x: &[f64]) -> (Vec<f64>, bool) {
        let params = self.params(x);
        let feasible = params.is_feasible();
        if !feasible {
            self.penalised.set(self.penalised.get() + 1);
        }
        let params = params.projected();
        let errors = self
            .targets
            .iter()
            .map(|t| {
                let vol = params.implied_vol(self.forward, t.strike, self.expiry);
                t.weight * (black_forward_value(t.option, self.forward, t.strike, vol, self.expiry) - t.value)
            })
            .collect();
        (errors, feasible)
    }

    fn objective(&self, x: &[f64]) -> f64 {
        let (errors, feasible) = self.errors(x);
        let sum: f64 = errors.iter().map(|e| e * e).sum();
        if feasible {
            sum
        } else {
            PENALTY * (1.0 + sum)
        }
    }

    fn residuals(&self, x: &[f64]) -> Vec<f64> {
        let (errors, feasible) = self.errors(x);
        if feasible {
            errors
        } else {
            let scale = PENALTY.sqrt();
            errors.iter().map(|e| scale * (e.abs() + 1.0)).collect()
        }
    }
}

/// Calibrates [`SabrSmile`]s at a fixed β.
#[derive(Debug, Clone, Default)]
pub struct SabrSolver {
    config: SabrConfig,
    used_iterations: u32,
}

impl SabrSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SabrConfig) -> Self {
        Self {
            config,
            used_iterations: 0,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &SabrConfig {
        &self.config
    }

    /// Optimiser tolerance.
    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    /// Iteration budget.
    pub fn max_iterations(&self) -> u32 {
        self.config.max_iterations
    }

    /// Optimiser iterations used by the last fit.
    pub fn used_iterations(&self) -> u32 {
        self.used_iterations
    }

    /// Fits SABR to the strikes and vols of a quoted smile.
    ///
    /// The quotes are first turned into strike/vol pairs with a
    /// [`SmileSolver`]; SABR then reprices the options at those strikes.
    pub fn solve(&mut self, name: &str, spec: &SmileSpec) -> SmileResult<SabrSmile> {
        if spec.quotes.is_empty() {
            return Err(SmileError::invalid_quote("SABR needs at least one wing quote"));
        }
        let pillars = SmileSolver::new(SmileSolverConfig::default().with_interpolation(InterpolatorKind::Linear))
            .solve(name, spec)?;
        self.fit(name, spec.forward, spec.expiry, pillars.strikes(), pillars.vols())
    }

    /// Fits SABR to market vols at the given strikes.
    pub fn fit(
        &mut self,
        name: &str,
        forward: f64,
        expiry: f64,
        strikes: &[f64],
        vols: &[f64],
    ) -> SmileResult<SabrSmile> {
        if strikes.len() != vols.len() {
            return Err(SmileError::invalid_input(format!(
                "{} strikes but {} vols",
                strikes.len(),
                vols.len()
            )));
        }
        if strikes.len() < 3 {
            return Err(SmileError::invalid_input("SABR needs at least three strikes"));
        }
        if !(forward > 0.0 && expiry > 0.0) {
            return Err(SmileError::invalid_input("forward and expiry must be positive"));
        }
        if !(0.0..=1.0).contains(&self.config.beta) {
            return Err(SmileError::invalid_input(format!("beta {} outside [0, 1]", self.config.beta)));
        }

        let targets = strikes
            .iter()
            .zip(vols)
            .map(|(&strike, &vol)| {
                if !(strike > 0.0 && vol > 0.0) {
                    return Err(SmileError::invalid_input(format!("strike {strike} / vol {vol} not positive")));
                }
                let option = if strike < forward { OptionType::Put } else { OptionType::Call };
                let weight = if self.config.vega_weighted {
                    1.0 / black_vega(forward, strike, vol, expiry)
                } else {
                    1.0
                };
                Ok(FitTarget {
                    strike,
                    option,
                    value: black_forward_value(option, forward, strike, vol, expiry),
                    weight,
                })
            })
            .collect::<SmileResult<Vec<_>>>()?;

        let problem = SabrProblem {
            forward,
            expiry,
            beta: self.config.beta,
            targets,
            penalised: Cell::new(0),
        };

        let atm_vol = strikes
            .iter()
            .zip(vols)
            .min_by(|a, b| (a.0 - forward).abs().total_cmp(&(b.0 - forward).abs()))
            .map_or(vols[0], |(_, v)| *v);
        let alpha = SabrParameters::alpha_from_atm_vol(atm_vol, forward, self.config.beta);
        let initial = [alpha, 0.0, 0.5];

        let config = OptimizationConfig::default()
            .with_tolerance(self.config.tolerance)
            .with_max_iterations(self.config.max_iterations);
        let result = match self.config.method {
            SabrFitMethod::NelderMead => {
                nelder_mead(|x| problem.objective(x), &initial, &[0.2 * alpha, 0.2, 0.2], &config)?
            }
            SabrFitMethod::GaussNewton => gauss_newton(|x| problem.residuals(x), &initial, &config)?,
        };
        self.used_iterations = result.iterations;

        if !result.parameters.iter().all(|p| p.is_finite()) || !result.objective_value.is_finite() {
            return Err(SmileError::non_finite("SABR parameters", result.iterations));
        }
        let params = problem.params(&result.parameters);
        if !params.is_feasible() {
            return Err(SmileError::infeasible(format!(
                "fit ended at alpha {}, rho {}, nu {}",
                params.alpha, params.rho, params.nu
            )));
        }

        let penalised = problem.penalised.get();
        if penalised > 0 {
            warn!(smile = name, evaluations = penalised, "SABR fit penalised infeasible parameters");
        }
        if !result.converged {
            warn!(smile = name, iterations = result.iterations, "SABR fit stopped before converging");
        }
        info!(
            smile = name,
            method = ?self.config.method,
            alpha = params.alpha,
            rho = params.rho,
            nu = params.nu,
            objective = result.objective_value,
            iterations = result.iterations,
            "SABR fit finished"
        );

        Ok(SabrSmile::new(name, forward, expiry, params))
    }
}
