//! Market data abstractions shared across crates.

use std::fmt::Debug;

/// A volatility surface queried by strike and time to expiry.
///
/// Curve sets carry volatility surfaces as auxiliary market data for
/// instruments with optionality. The smile crate implements this for its
/// fitted smiles; callers may plug in their own surfaces.
pub trait VolSurface: Send + Sync + Debug {
    /// Name of the surface, used as its key inside a curve set.
    fn name(&self) -> &str;

    /// Black volatility at the given strike and expiry (in years).
    fn volatility(&self, strike: f64, expiry: f64) -> f64;
}

/// A flat volatility surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVolSurface {
    name: String,
    vol: f64,
}

impl FlatVolSurface {
    /// Creates a flat surface returning `vol` everywhere.
    #[must_use]
    pub fn new(name: impl Into<String>, vol: f64) -> Self {
        Self {
            name: name.into(),
            vol,
        }
    }
}

impl VolSurface for FlatVolSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn volatility(&self, _strike: f64, _expiry: f64) -> f64 {
        self.vol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_surface() {
        let s = FlatVolSurface::new("EURUSD", 0.1);
        assert_eq!(s.name(), "EURUSD");
        assert_eq!(s.volatility(1.1, 0.5), 0.1);
        assert_eq!(s.volatility(1.3, 2.0), 0.1);
    }
}
