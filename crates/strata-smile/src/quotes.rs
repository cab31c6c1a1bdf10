//! Delta-quoted smile market data.

use serde::{Deserialize, Serialize};

use crate::black::{AtmConvention, DeltaType};
use crate::error::{SmileError, SmileResult};

/// Risk reversal and butterfly at one delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileQuote {
    /// Unsigned delta of the wing options, e.g. `0.25`.
    pub delta: f64,
    /// Call vol minus put vol.
    pub risk_reversal: f64,
    /// Butterfly (strangle) vol over ATM.
    pub butterfly: f64,
}

impl SmileQuote {
    /// Creates a quote.
    #[must_use]
    pub fn new(delta: f64, risk_reversal: f64, butterfly: f64) -> Self {
        Self {
            delta,
            risk_reversal,
            butterfly,
        }
    }

    /// Wing vols under simple quoting: `(put, call)`.
    #[must_use]
    pub fn simple_wings(&self, atm_vol: f64) -> (f64, f64) {
        let mid = atm_vol + self.butterfly;
        (mid - 0.5 * self.risk_reversal, mid + 0.5 * self.risk_reversal)
    }
}

/// How butterflies are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlyQuoting {
    /// The smile's own wing vols average to `ATM + BF`.
    #[default]
    Simple,
    /// `ATM + BF` is a single vol pricing the market strangle at the
    /// quoted delta; the smile must reprice that strangle.
    Market,
}

/// One expiry's smile: forward, ATM vol and wing quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmileSpec {
    /// Forward.
    pub forward: f64,
    /// Time to expiry in years.
    pub expiry: f64,
    /// ATM vol.
    pub atm_vol: f64,
    /// Wing quotes.
    pub quotes: Vec<SmileQuote>,
    /// Delta convention.
    #[serde(default)]
    pub delta_type: DeltaType,
    /// ATM strike convention.
    #[serde(default)]
    pub atm_convention: AtmConvention,
    /// Butterfly convention.
    #[serde(default)]
    pub fly_quoting: FlyQuoting,
}

impl SmileSpec {
    /// Creates a spec with no wing quotes and default conventions.
    #[must_use]
    pub fn new(forward: f64, expiry: f64, atm_vol: f64) -> Self {
        Self {
            forward,
            expiry,
            atm_vol,
            quotes: Vec::new(),
            delta_type: DeltaType::default(),
            atm_convention: AtmConvention::default(),
            fly_quoting: FlyQuoting::default(),
        }
    }

    /// Adds a wing quote.
    #[must_use]
    pub fn with_quote(mut self, quote: SmileQuote) -> Self {
        self.quotes.push(quote);
        self
    }

    /// Sets the delta convention.
    #[must_use]
    pub fn with_delta_type(mut self, delta_type: DeltaType) -> Self {
        self.delta_type = delta_type;
        self
    }

    /// Sets the ATM convention.
    #[must_use]
    pub fn with_atm_convention(mut self, convention: AtmConvention) -> Self {
        self.atm_convention = convention;
        self
    }

    /// Sets the butterfly convention.
    #[must_use]
    pub fn with_fly_quoting(mut self, quoting: FlyQuoting) -> Self {
        self.fly_quoting = quoting;
        self
    }

    /// Quotes ordered by ascending delta (outermost wings first).
    #[must_use]
    pub fn sorted_quotes(&self) -> Vec<SmileQuote> {
        let mut quotes = self.quotes.clone();
        quotes.sort_by(|a, b| a.delta.total_cmp(&b.delta));
        quotes
    }

    /// Checks the market data.
    pub fn validate(&self) -> SmileResult<()> {
        for (name, value) in [("forward", self.forward), ("expiry", self.expiry), ("ATM vol", self.atm_vol)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SmileError::invalid_input(format!("{name} must be positive, got {value}")));
            }
        }

        let quotes = self.sorted_quotes();
        for quote in &quotes {
            if !(quote.delta > 0.0 && quote.delta < 0.5) {
                return Err(SmileError::invalid_quote(format!("delta {} outside (0, 0.5)", quote.delta)));
            }
            if !(quote.risk_reversal.is_finite() && quote.butterfly.is_finite()) {
                return Err(SmileError::invalid_quote(format!("non-finite quote at delta {}", quote.delta)));
            }
            let (put, call) = quote.simple_wings(self.atm_vol);
            if put <= 0.0 || call <= 0.0 {
                return Err(SmileError::invalid_quote(format!(
                    "quote at delta {} implies a non-positive wing vol",
                    quote.delta
                )));
            }
        }
        if quotes.windows(2).any(|w| w[0].delta == w[1].delta) {
            return Err(SmileError::invalid_quote("duplicate quote deltas"));
        }
        Ok(())
    }
}
