//! Black-76 forward values, deltas and delta-to-strike conversion.
//!
//! All values are undiscounted (forward) and per unit notional. With
//! `s = σ√T`:
//!
//! ```text
//! d1 = (ln(F/K) + s²/2) / s        d2 = d1 - s
//! call = F N(d1) - K N(d2)         put = K N(-d2) - F N(-d1)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_math::distributions::{norm_cdf, norm_inv_cdf, norm_pdf};
use strata_math::solvers::{brent, SolverConfig};

use crate::error::{SmileError, SmileResult};

/// Bracket on d2 for premium-adjusted strike searches.
const D2_BRACKET: f64 = 10.0;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionType {
    /// +1 for calls, -1 for puts.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Delta convention of the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeltaType {
    /// `ω N(ω d1)`
    #[default]
    Forward,
    /// `ω (K/F) N(ω d2)`, delta net of the premium paid in the base currency.
    ForwardPremiumAdjusted,
}

/// Definition of the ATM strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AtmConvention {
    /// ATM forward: `K = F`.
    Forward,
    /// Zero-delta straddle.
    #[default]
    DeltaNeutral,
}

fn d1_d2(forward: f64, strike: f64, vol: f64, expiry: f64) -> (f64, f64) {
    let s = vol * expiry.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * s * s) / s;
    (d1, d1 - s)
}

fn degenerate(vol: f64, expiry: f64) -> bool {
    vol <= 0.0 || expiry <= 0.0
}

/// Undiscounted Black value.
///
/// Collapses to intrinsic value when there is no time or no vol.
#[must_use]
pub fn black_forward_value(option: OptionType, forward: f64, strike: f64, vol: f64, expiry: f64) -> f64 {
    let w = option.sign();
    if degenerate(vol, expiry) {
        return (w * (forward - strike)).max(0.0);
    }
    let (d1, d2) = d1_d2(forward, strike, vol, expiry);
    w * (forward * norm_cdf(w * d1) - strike * norm_cdf(w * d2))
}

/// Undiscounted Black vega, `F n(d1) √T`.
#[must_use]
pub fn black_vega(forward: f64, strike: f64, vol: f64, expiry: f64) -> f64 {
    if degenerate(vol, expiry) {
        return 0.0;
    }
    let (d1, _) = d1_d2(forward, strike, vol, expiry);
    forward * norm_pdf(d1) * expiry.sqrt()
}

/// Forward delta under the given convention.
#[must_use]
pub fn forward_delta(
    option: OptionType,
    forward: f64,
    strike: f64,
    vol: f64,
    expiry: f64,
    delta_type: DeltaType,
) -> f64 {
    let w = option.sign();
    if degenerate(vol, expiry) {
        let itm = w * (forward - strike) > 0.0;
        let base = if itm { w } else { 0.0 };
        return match delta_type {
            DeltaType::Forward => base,
            DeltaType::ForwardPremiumAdjusted => base * strike / forward,
        };
    }
    let (d1, d2) = d1_d2(forward, strike, vol, expiry);
    match delta_type {
        DeltaType::Forward => w * norm_cdf(w * d1),
        DeltaType::ForwardPremiumAdjusted => w * strike / forward * norm_cdf(w * d2),
    }
}

fn validate_market(forward: f64, vol: f64, expiry: f64) -> SmileResult<()> {
    if !(forward.is_finite() && forward > 0.0) {
        return Err(SmileError::invalid_input(format!("forward must be positive, got {forward}")));
    }
    if !(vol.is_finite() && vol > 0.0) {
        return Err(SmileError::invalid_input(format!("vol must be positive, got {vol}")));
    }
    if !(expiry.is_finite() && expiry > 0.0) {
        return Err(SmileError::invalid_input(format!("expiry must be positive, got {expiry}")));
    }
    Ok(())
}

/// Strike whose delta equals `delta`.
///
/// Forward deltas invert in closed form. Premium-adjusted call deltas are
/// not monotonic in strike; the root is taken on the branch above the
/// delta maximum, found with Brent's method in d2.
pub fn strike_from_delta(
    option: OptionType,
    delta: f64,
    forward: f64,
    vol: f64,
    expiry: f64,
    delta_type: DeltaType,
) -> SmileResult<f64> {
    validate_market(forward, vol, expiry)?;
    let w = option.sign();
    if !(delta.is_finite() && w * delta > 0.0) {
        return Err(SmileError::invalid_quote(format!("{option} delta {delta} has the wrong sign")));
    }
    let s = vol * expiry.sqrt();
    let strike_at_d2 = |d2: f64| forward * (-d2 * s - 0.5 * s * s).exp();

    match delta_type {
        DeltaType::Forward => {
            if w * delta >= 1.0 {
                return Err(SmileError::invalid_quote(format!("forward delta {delta} outside (-1, 1)")));
            }
            let d1 = w * norm_inv_cdf(w * delta);
            Ok(forward * (-d1 * s + 0.5 * s * s).exp())
        }
        DeltaType::ForwardPremiumAdjusted => {
            let config = SolverConfig::new(1e-14, 200);
            let pa_delta = |d2: f64| w * (-d2 * s - 0.5 * s * s).exp() * norm_cdf(w * d2);
            let upper = match option {
                OptionType::Call => {
                    // Delta peaks where s N(d2) = n(d2)
                    let peak = brent(|d2| s * norm_cdf(d2) - norm_pdf(d2), -D2_BRACKET, D2_BRACKET, &config)?.root;
                    if delta >= pa_delta(peak) {
                        return Err(SmileError::invalid_quote(format!(
                            "premium-adjusted call delta {delta} exceeds the maximum {:.6}",
                            pa_delta(peak)
                        )));
                    }
                    peak
                }
                OptionType::Put => D2_BRACKET,
            };
            let d2 = brent(|d2| pa_delta(d2) - delta, -D2_BRACKET, upper, &config)?.root;
            Ok(strike_at_d2(d2))
        }
    }
}

/// ATM strike for the given conventions.
#[must_use]
pub fn atm_strike(forward: f64, vol: f64, expiry: f64, convention: AtmConvention, delta_type: DeltaType) -> f64 {
    let half_var = 0.5 * vol * vol * expiry.max(0.0);
    match (convention, delta_type) {
        (AtmConvention::Forward, _) => forward,
        (AtmConvention::DeltaNeutral, DeltaType::Forward) => forward * half_var.exp(),
        (AtmConvention::DeltaNeutral, DeltaType::ForwardPremiumAdjusted) => forward * (-half_var).exp(),
    }
}
