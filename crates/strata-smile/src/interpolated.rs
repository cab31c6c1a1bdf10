//! Interpolated smiles fitted to ATM, risk-reversal and butterfly quotes.
//!
//! The smile holds one vol per quoted strike: the put wings (outermost
//! first), the ATM strike, then the call wings. Strikes follow from the
//! vols through the quote's delta convention, so moving a vol moves its
//! strike too.
//!
//! # Solving
//!
//! - [`FlyQuoting::Simple`]: the wing vols are `ATM + BF ∓ RR/2`. No
//!   iteration is needed.
//! - [`FlyQuoting::Market`]: `ATM + BF` prices a strangle at the quoted
//!   delta. Newton iterates the wing vols until, for every quote, the
//!   interpolated smile reprices that strangle and its own wing vols differ
//!   by the risk reversal.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use strata_core::traits::VolSurface;
use strata_math::interpolation::{Extrapolation, Interpolator, InterpolatorKind};
use strata_math::linear_algebra::solve_linear_system;
use tracing::{debug, info, warn};

use crate::black::{atm_strike, black_forward_value, black_vega, strike_from_delta, OptionType};
use crate::error::{SmileError, SmileResult};
use crate::quotes::{FlyQuoting, SmileQuote, SmileSpec};

/// A smile interpolated in strike between fitted vols.
#[derive(Debug, Clone)]
pub struct InterpolatedSmile {
    name: String,
    forward: f64,
    expiry: f64,
    strikes: Vec<f64>,
    vols: Vec<f64>,
    interpolation: InterpolatorKind,
    interpolator: Arc<dyn Interpolator>,
}

impl InterpolatedSmile {
    /// Creates a smile through `(strikes, vols)`, flat beyond the end strikes.
    pub fn new(
        name: impl Into<String>,
        forward: f64,
        expiry: f64,
        strikes: Vec<f64>,
        vols: Vec<f64>,
        interpolation: InterpolatorKind,
    ) -> SmileResult<Self> {
        if let Some(v) = vols.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(SmileError::invalid_input(format!("smile vol {v} is not positive")));
        }
        let interpolator: Arc<dyn Interpolator> = interpolation
            .build(strikes.clone(), vols.clone(), Extrapolation::Flat)?
            .into();
        Ok(Self {
            name: name.into(),
            forward,
            expiry,
            strikes,
            vols,
            interpolation,
            interpolator,
        })
    }

    /// Surface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Time to expiry in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Knot strikes, ascending.
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    /// Knot vols.
    pub fn vols(&self) -> &[f64] {
        &self.vols
    }

    /// Interpolation method.
    pub fn interpolation(&self) -> InterpolatorKind {
        self.interpolation
    }

    /// Vol at `strike`.
    pub fn vol(&self, strike: f64) -> SmileResult<f64> {
        Ok(self.interpolator.interpolate(strike)?)
    }
}

impl VolSurface for InterpolatedSmile {
    fn name(&self) -> &str {
        &self.name
    }

    /// Knots extrapolate flat, so every finite strike has a vol; an
    /// interpolation failure is logged and reported as NaN.
    fn volatility(&self, strike: f64, _expiry: f64) -> f64 {
        match self.vol(strike) {
            Ok(vol) => vol,
            Err(e) => {
                warn!(smile = %self.name, strike, error = %e, "smile lookup failed");
                f64::NAN
            }
        }
    }
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> u32 {
    100
}

fn default_bump() -> f64 {
    1e-7
}

fn default_interpolation() -> InterpolatorKind {
    InterpolatorKind::CubicSpline
}

/// Smile solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileSolverConfig {
    /// Largest residual accepted, in vol units.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Newton iteration budget.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Vol bump for the finite-difference Jacobian.
    #[serde(default = "default_bump")]
    pub bump: f64,
    /// Interpolation in strike.
    #[serde(default = "default_interpolation")]
    pub interpolation: InterpolatorKind,
}

impl Default for SmileSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            bump: default_bump(),
            interpolation: default_interpolation(),
        }
    }
}

impl SmileSolverConfig {
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

    /// Sets the Jacobian bump.
    #[must_use]
    pub fn with_bump(mut self, bump: f64) -> Self {
        self.bump = bump;
        self
    }

    /// Sets the interpolation.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: InterpolatorKind) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// Market strangle a quote must reprice.
struct StrangleTarget {
    put_strike: f64,
    call_strike: f64,
    value: f64,
    vega: f64,
}

/// Fits [`InterpolatedSmile`]s to [`SmileSpec`]s.
#[derive(Debug, Clone, Default)]
pub struct SmileSolver {
    config: SmileSolverConfig,
    used_iterations: u32,
}

impl SmileSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SmileSolverConfig) -> Self {
        Self {
            config,
            used_iterations: 0,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &SmileSolverConfig {
        &self.config
    }

    /// Convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    /// Iteration budget.
    pub fn max_iterations(&self) -> u32 {
        self.config.max_iterations
    }

    /// Newton iterations used by the last solve; zero for closed-form fits.
    pub fn used_iterations(&self) -> u32 {
        self.used_iterations
    }

    /// Fits a smile to `spec`.
    pub fn solve(&mut self, name: &str, spec: &SmileSpec) -> SmileResult<InterpolatedSmile> {
        spec.validate()?;
        self.used_iterations = 0;
        let quotes = spec.sorted_quotes();

        let mut wings: Vec<f64> = quotes.iter().map(|q| q.simple_wings(spec.atm_vol).0).collect();
        wings.extend(quotes.iter().map(|q| q.simple_wings(spec.atm_vol).1));

        if spec.fly_quoting == FlyQuoting::Market && !quotes.is_empty() {
            wings = self.solve_market(name, spec, &quotes, wings)?;
        }

        let smile = self.build(name, spec, &quotes, &wings)?;
        info!(
            smile = name,
            quotes = quotes.len(),
            fly_quoting = ?spec.fly_quoting,
            iterations = self.used_iterations,
            "smile fitted"
        );
        Ok(smile)
    }

    /// Smile from wing vols laid out as `[puts.., calls..]` in quote order.
    fn build(
        &self,
        name: &str,
        spec: &SmileSpec,
        quotes: &[SmileQuote],
        wings: &[f64],
    ) -> SmileResult<InterpolatedSmile> {
        let n = quotes.len();
        let (puts, calls) = wings.split_at(n);
        let mut strikes = Vec::with_capacity(2 * n + 1);
        let mut vols = Vec::with_capacity(2 * n + 1);

        for (quote, &vol) in quotes.iter().zip(puts) {
            strikes.push(strike_from_delta(
                OptionType::Put,
                -quote.delta,
                spec.forward,
                vol,
                spec.expiry,
                spec.delta_type,
            )?);
            vols.push(vol);
        }
        strikes.push(atm_strike(
            spec.forward,
            spec.atm_vol,
            spec.expiry,
            spec.atm_convention,
            spec.delta_type,
        ));
        vols.push(spec.atm_vol);
        for (quote, &vol) in quotes.iter().zip(calls).rev() {
            strikes.push(strike_from_delta(
                OptionType::Call,
                quote.delta,
                spec.forward,
                vol,
                spec.expiry,
                spec.delta_type,
            )?);
            vols.push(vol);
        }

        InterpolatedSmile::new(name, spec.forward, spec.expiry, strikes, vols, self.config.interpolation)
    }

    fn strangle_target(spec: &SmileSpec, quote: &SmileQuote) -> SmileResult<StrangleTarget> {
        let vol = spec.atm_vol + quote.butterfly;
        let (f, t) = (spec.forward, spec.expiry);
        let put_strike = strike_from_delta(OptionType::Put, -quote.delta, f, vol, t, spec.delta_type)?;
        let call_strike = strike_from_delta(OptionType::Call, quote.delta, f, vol, t, spec.delta_type)?;
        Ok(StrangleTarget {
            put_strike,
            call_strike,
            value: black_forward_value(OptionType::Put, f, put_strike, vol, t)
                + black_forward_value(OptionType::Call, f, call_strike, vol, t),
            vega: black_vega(f, put_strike, vol, t) + black_vega(f, call_strike, vol, t),
        })
    }

    /// Risk-reversal and strangle residuals, both in vol units.
    fn residuals(
        &self,
        name: &str,
        spec: &SmileSpec,
        quotes: &[SmileQuote],
        targets: &[StrangleTarget],
        wings: &[f64],
    ) -> SmileResult<Vec<f64>> {
        let n = quotes.len();
        let smile = self.build(name, spec, quotes, wings)?;
        let (f, t) = (spec.forward, spec.expiry);

        let mut r = vec![0.0; 2 * n];
        for (i, (quote, target)) in quotes.iter().zip(targets).enumerate() {
            r[i] = wings[n + i] - wings[i] - quote.risk_reversal;
            let value = black_forward_value(OptionType::Put, f, target.put_strike, smile.vol(target.put_strike)?, t)
                + black_forward_value(OptionType::Call, f, target.call_strike, smile.vol(target.call_strike)?, t);
            r[n + i] = (value - target.value) / target.vega;
        }
        Ok(r)
    }

    fn solve_market(
        &mut self,
        name: &str,
        spec: &SmileSpec,
        quotes: &[SmileQuote],
        mut wings: Vec<f64>,
    ) -> SmileResult<Vec<f64>> {
        let targets = quotes
            .iter()
            .map(|q| Self::strangle_target(spec, q))
            .collect::<SmileResult<Vec<_>>>()?;
        let size = wings.len();
        let mut iterations = 0;

        loop {
            let r = self.residuals(name, spec, quotes, &targets, &wings)?;
            let residual = r.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            if !residual.is_finite() {
                return Err(SmileError::non_finite("smile residual", iterations));
            }
            debug!(smile = name, iteration = iterations, residual, "smile newton iteration");

            if residual < self.config.tolerance {
                self.used_iterations = iterations;
                return Ok(wings);
            }
            if iterations >= self.config.max_iterations {
                self.used_iterations = iterations;
                warn!(smile = name, iterations, residual, "smile solve did not converge");
                return Err(SmileError::NotConverged { iterations, residual });
            }

            let mut jacobian = DMatrix::zeros(size, size);
            for j in 0..size {
                let mut bumped = wings.clone();
                bumped[j] += self.config.bump;
                let rb = self.residuals(name, spec, quotes, &targets, &bumped)?;
                for i in 0..size {
                    jacobian[(i, j)] = (rb[i] - r[i]) / self.config.bump;
                }
            }

            let step = solve_linear_system(&jacobian, &DVector::from_vec(r))?;
            for (w, d) in wings.iter_mut().zip(step.iter()) {
                *w -= d;
            }
            iterations += 1;
            if !wings.iter().all(|w| w.is_finite()) {
                return Err(SmileError::non_finite("smile vols", iterations));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::black::DeltaType;
    use approx::assert_relative_eq;

    fn market_spec() -> SmileSpec {
        SmileSpec::new(1.35, 1.0, 0.10)
            .with_quote(SmileQuote::new(0.25, -0.015, 0.004))
            .with_quote(SmileQuote::new(0.10, -0.030, 0.012))
            .with_fly_quoting(FlyQuoting::Market)
    }

    #[test]
    fn test_smile_interpolates_and_extrapolates_flat() {
        let smile = InterpolatedSmile::new("S", 1.0, 1.0, vec![0.9, 1.0, 1.1], vec![0.12, 0.10, 0.11], InterpolatorKind::Linear)
            .unwrap();
        assert_relative_eq!(smile.vol(0.95).unwrap(), 0.11, epsilon = 1e-14);
        assert_relative_eq!(smile.volatility(0.5, 1.0), 0.12, epsilon = 1e-14);
        assert_relative_eq!(smile.volatility(2.0, 1.0), 0.11, epsilon = 1e-14);
    }

    #[test]
    fn test_surface_lookup_is_finite_everywhere() {
        for kind in [InterpolatorKind::Linear, InterpolatorKind::LogLinear, InterpolatorKind::CubicSpline] {
            let smile = InterpolatedSmile::new("S", 1.0, 1.0, vec![0.9, 1.0, 1.1], vec![0.12, 0.10, 0.11], kind).unwrap();
            for strike in [1e-6, 0.5, 0.95, 1.05, 2.0, 1e6] {
                let vol = smile.volatility(strike, 1.0);
                assert!(vol.is_finite() && vol > 0.0, "{kind:?} at {strike}: {vol}");
            }
            assert_relative_eq!(smile.volatility(1e-6, 1.0), 0.12, epsilon = 1e-14);
            assert_relative_eq!(smile.volatility(1e6, 1.0), 0.11, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_smile_rejects_bad_vols() {
        assert!(InterpolatedSmile::new("S", 1.0, 1.0, vec![0.9, 1.0], vec![0.1, -0.1], InterpolatorKind::Linear).is_err());
        assert!(InterpolatedSmile::new("S", 1.0, 1.0, vec![1.0, 0.9], vec![0.1, 0.1], InterpolatorKind::Linear).is_err());
    }

    #[test]
    fn test_atm_only_spec() {
        let mut solver = SmileSolver::default();
        let smile = solver.solve("S", &SmileSpec::new(1.0, 0.5, 0.2)).unwrap();
        assert_eq!(smile.vols(), &[0.2]);
        assert_eq!(solver.used_iterations(), 0);
    }

    #[test]
    fn test_market_strangle_repriced() {
        let spec = market_spec();
        let mut solver = SmileSolver::default();
        let smile = solver.solve("EURUSD.1Y", &spec).unwrap();

        assert!(solver.used_iterations() > 0);
        assert_eq!(smile.vols().len(), 5);
        assert!(smile.strikes().windows(2).all(|w| w[0] < w[1]));

        let vols = smile.vols();
        // 25d wings are the inner knots, 10d the outer ones
        assert_relative_eq!(vols[3] - vols[1], -0.015, epsilon = 1e-9);
        assert_relative_eq!(vols[4] - vols[0], -0.030, epsilon = 1e-9);

        for quote in spec.sorted_quotes() {
            let target = SmileSolver::strangle_target(&spec, &quote).unwrap();
            let model = black_forward_value(OptionType::Put, spec.forward, target.put_strike, smile.vol(target.put_strike).unwrap(), spec.expiry)
                + black_forward_value(OptionType::Call, spec.forward, target.call_strike, smile.vol(target.call_strike).unwrap(), spec.expiry);
            assert!((model - target.value).abs() < 1e-9 * target.vega);
        }
    }

    #[test]
    fn test_market_flies_differ_from_simple() {
        let spec = market_spec();
        let market = SmileSolver::default().solve("M", &spec).unwrap();
        let simple = SmileSolver::default()
            .solve("S", &spec.clone().with_fly_quoting(FlyQuoting::Simple))
            .unwrap();
        let gap = market
            .vols()
            .iter()
            .zip(simple.vols())
            .fold(0.0_f64, |acc, (m, s)| acc.max((m - s).abs()));
        assert!(gap > 1e-7);
        assert_eq!(market.vols()[2], simple.vols()[2]);
    }

    #[test]
    fn test_zero_quotes_keep_flat_smile() {
        let spec = SmileSpec::new(1.0, 0.5, 0.15)
            .with_quote(SmileQuote::new(0.25, 0.0, 0.0))
            .with_fly_quoting(FlyQuoting::Market)
            .with_delta_type(DeltaType::ForwardPremiumAdjusted);
        let mut solver = SmileSolver::default();
        let smile = solver.solve("S", &spec).unwrap();
        assert_eq!(solver.used_iterations(), 0);
        for vol in smile.vols() {
            assert_relative_eq!(*vol, 0.15, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_budget_exhaustion_is_an_error() {
        let config = SmileSolverConfig::default().with_max_iterations(0);
        let err = SmileSolver::new(config).solve("S", &market_spec()).unwrap_err();
        assert!(matches!(err, SmileError::NotConverged { iterations: 0, .. }));
    }
}
