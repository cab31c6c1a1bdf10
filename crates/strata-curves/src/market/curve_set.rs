//! Curve set and its frozen snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use strata_core::daycounts::DayCountConvention;
use strata_core::traits::VolSurface;
use strata_core::types::{Currency, Date};

use super::FxMatrix;
use crate::curves::{BasisPriceCurve, CurveKind, HazardCurve, IrCurve, MarketCurve, PillarCurve, PriceCurve};
use crate::error::{CurveError, CurveResult};

/// Named curves sharing one build date, plus FX spots and vol surfaces.
///
/// Curves are kept in name order, which fixes the order in which the
/// calibration engine visits curves inside a stage.
///
/// Every curve is an unknown of its solve stage unless it is marked fixed
/// with [`CurveSet::fix`]. Fixed curves are market inputs: instruments may
/// read them but not target them.
#[derive(Clone)]
pub struct CurveSet {
    build_date: Date,
    curves: BTreeMap<String, MarketCurve>,
    fixed: BTreeSet<String>,
    fx: FxMatrix,
    vol_surfaces: BTreeMap<String, Arc<dyn VolSurface>>,
}

impl fmt::Debug for CurveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveSet")
            .field("build_date", &self.build_date)
            .field("curves", &self.curves.keys().collect::<Vec<_>>())
            .field("fixed", &self.fixed)
            .field("fx", &self.fx)
            .field("vol_surfaces", &self.vol_surfaces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CurveSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(build_date: Date) -> Self {
        Self {
            build_date,
            curves: BTreeMap::new(),
            fixed: BTreeSet::new(),
            fx: FxMatrix::default(),
            vol_surfaces: BTreeMap::new(),
        }
    }

    /// Build date shared by every curve.
    pub fn build_date(&self) -> Date {
        self.build_date
    }

    /// Adds a curve, failing on a duplicate name or a different build date.
    pub fn insert(&mut self, curve: impl Into<MarketCurve>) -> CurveResult<()> {
        let curve = curve.into();
        if curve.build_date() != self.build_date {
            return Err(CurveError::BuildDateMismatch {
                name: curve.name().to_string(),
                expected: self.build_date,
                got: curve.build_date(),
            });
        }
        if self.curves.contains_key(curve.name()) {
            return Err(CurveError::DuplicateCurve {
                name: curve.name().to_string(),
            });
        }
        self.curves.insert(curve.name().to_string(), curve);
        Ok(())
    }

    /// Adds a curve in builder style.
    pub fn with_curve(mut self, curve: impl Into<MarketCurve>) -> CurveResult<Self> {
        self.insert(curve)?;
        Ok(self)
    }

    /// Replaces a curve of the same name, or inserts it.
    pub fn replace(&mut self, curve: impl Into<MarketCurve>) -> CurveResult<Option<MarketCurve>> {
        let curve = curve.into();
        if curve.build_date() != self.build_date {
            return Err(CurveError::BuildDateMismatch {
                name: curve.name().to_string(),
                expected: self.build_date,
                got: curve.build_date(),
            });
        }
        Ok(self.curves.insert(curve.name().to_string(), curve))
    }

    /// Removes a curve by name.
    pub fn remove(&mut self, name: &str) -> Option<MarketCurve> {
        self.fixed.remove(name);
        self.curves.remove(name)
    }

    /// Marks a curve as a fixed input that calibration never solves.
    pub fn fix(&mut self, name: &str) -> CurveResult<()> {
        self.curve(name)?;
        self.fixed.insert(name.to_string());
        Ok(())
    }

    /// Marks a curve as fixed in builder style.
    pub fn with_fixed(mut self, name: &str) -> CurveResult<Self> {
        self.fix(name)?;
        Ok(self)
    }

    /// Marks every curve currently in the set as fixed.
    pub fn fix_all(&mut self) {
        self.fixed.extend(self.curves.keys().cloned());
    }

    /// Makes a fixed curve solvable again.
    pub fn unfix(&mut self, name: &str) -> bool {
        self.fixed.remove(name)
    }

    /// Whether a curve is a fixed input.
    pub fn is_fixed(&self, name: &str) -> bool {
        self.fixed.contains(name)
    }

    /// Curves that calibration solves, in name order.
    pub fn solvable_curves(&self) -> impl Iterator<Item = &MarketCurve> {
        self.curves
            .iter()
            .filter(|(name, _)| !self.fixed.contains(*name))
            .map(|(_, curve)| curve)
    }

    /// Whether a curve of this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Curve names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    /// Curves in name order.
    pub fn curves(&self) -> impl Iterator<Item = &MarketCurve> {
        self.curves.values()
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// Whether the set holds no curves.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Looks up a curve.
    pub fn curve(&self, name: &str) -> CurveResult<&MarketCurve> {
        self.curves
            .get(name)
            .ok_or_else(|| CurveError::curve_not_found(name))
    }

    /// Looks up a curve for mutation.
    pub fn curve_mut(&mut self, name: &str) -> CurveResult<&mut MarketCurve> {
        self.curves
            .get_mut(name)
            .ok_or_else(|| CurveError::curve_not_found(name))
    }

    /// Looks up an interest-rate curve.
    pub fn ir_curve(&self, name: &str) -> CurveResult<&IrCurve> {
        self.curve(name)?.as_ir()
    }

    /// Looks up a price curve.
    pub fn price_curve(&self, name: &str) -> CurveResult<&PriceCurve> {
        self.curve(name)?.as_price()
    }

    /// Looks up a basis price curve.
    pub fn basis_curve(&self, name: &str) -> CurveResult<&BasisPriceCurve> {
        self.curve(name)?.as_basis()
    }

    /// Looks up a hazard curve.
    pub fn hazard_curve(&self, name: &str) -> CurveResult<&HazardCurve> {
        self.curve(name)?.as_hazard()
    }

    /// Discount factor from an interest-rate curve.
    pub fn discount_factor(&self, curve: &str, date: Date) -> CurveResult<f64> {
        self.ir_curve(curve)?.discount_factor(date)
    }

    /// Simply-compounded forward rate from an interest-rate curve.
    pub fn forward_rate(
        &self,
        curve: &str,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
    ) -> CurveResult<f64> {
        self.ir_curve(curve)?.forward_rate(start, end, day_count)
    }

    /// Survival probability from a hazard curve.
    pub fn survival_probability(&self, curve: &str, date: Date) -> CurveResult<f64> {
        self.hazard_curve(curve)?.survival_probability(date)
    }

    /// Forward price from a price curve or a basis curve resolved to its base.
    pub fn price(&self, curve: &str, date: Date) -> CurveResult<f64> {
        let mut total = 0.0;
        for name in self.price_chain(curve)? {
            total += self.curve(name)?.value_at(date)?;
        }
        Ok(total)
    }

    /// Names of the curves whose values add up to `curve`'s price: the curve
    /// itself, then each basis curve's base, ending at a plain price curve.
    pub fn price_chain<'a>(&'a self, curve: &'a str) -> CurveResult<Vec<&'a str>> {
        let mut chain: Vec<&str> = Vec::new();
        let mut name = curve;
        loop {
            if chain.contains(&name) {
                return Err(CurveError::BasisCycle {
                    curve: name.to_string(),
                });
            }
            chain.push(name);
            match self.curve(name)? {
                MarketCurve::Price(_) => return Ok(chain),
                MarketCurve::BasisPrice(basis) => name = basis.base_curve(),
                other => {
                    return Err(CurveError::wrong_kind(
                        name,
                        CurveKind::Price.to_string(),
                        other.kind().to_string(),
                    ))
                }
            }
        }
    }

    /// FX matrix.
    pub fn fx(&self) -> &FxMatrix {
        &self.fx
    }

    /// Replaces the FX matrix.
    #[must_use]
    pub fn with_fx(mut self, fx: FxMatrix) -> Self {
        self.fx = fx;
        self
    }

    /// Units of `to` per unit of `from`.
    pub fn fx_rate(&self, from: Currency, to: Currency) -> CurveResult<f64> {
        self.fx.rate(from, to)
    }

    /// Registers a volatility surface under its own name.
    pub fn add_vol_surface(&mut self, surface: Arc<dyn VolSurface>) {
        self.vol_surfaces.insert(surface.name().to_string(), surface);
    }

    /// Registers a volatility surface in builder style.
    #[must_use]
    pub fn with_vol_surface(mut self, surface: Arc<dyn VolSurface>) -> Self {
        self.add_vol_surface(surface);
        self
    }

    /// Looks up a volatility surface.
    pub fn vol_surface(&self, name: &str) -> CurveResult<&dyn VolSurface> {
        self.vol_surfaces
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| CurveError::VolSurfaceNotFound {
                name: name.to_string(),
            })
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn freeze(&self) -> FrozenCurveSet {
        FrozenCurveSet(Arc::new(self.clone()))
    }

    /// Converts into a snapshot without copying.
    #[must_use]
    pub fn into_frozen(self) -> FrozenCurveSet {
        FrozenCurveSet(Arc::new(self))
    }
}

/// Immutable, shareable curve set.
///
/// Dereferences to [`CurveSet`] for every read-only query. Clones share the
/// same underlying curves.
#[derive(Debug, Clone)]
pub struct FrozenCurveSet(Arc<CurveSet>);

impl FrozenCurveSet {
    /// Mutable copy for recalibration.
    #[must_use]
    pub fn thaw(&self) -> CurveSet {
        self.0.as_ref().clone()
    }
}

impl Deref for FrozenCurveSet {
    type Target = CurveSet;

    fn deref(&self) -> &CurveSet {
        &self.0
    }
}

impl From<CurveSet> for FrozenCurveSet {
    fn from(curves: CurveSet) -> Self {
        curves.into_frozen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strata_core::traits::FlatVolSurface;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn sample() -> CurveSet {
        let build = d(2025, 1, 1);
        let pillars = vec![d(2025, 7, 1), d(2026, 1, 1)];
        CurveSet::new(build)
            .with_curve(IrCurve::flat("USD.OIS", build, pillars.clone(), 0.04).unwrap())
            .unwrap()
            .with_curve(PriceCurve::new("WTI", build, pillars.clone(), vec![70.0, 72.0]).unwrap())
            .unwrap()
            .with_curve(BasisPriceCurve::new("WCS", "WTI", build, pillars.clone(), vec![-10.0, -12.0]).unwrap())
            .unwrap()
            .with_curve(BasisPriceCurve::new("WCS.HARDISTY", "WCS", build, pillars, vec![1.0, 1.0]).unwrap())
            .unwrap()
    }

    #[test]
    fn test_insert_validation() {
        let mut set = sample();
        let build = set.build_date();
        let dup = IrCurve::flat("USD.OIS", build, vec![d(2026, 1, 1)], 0.05).unwrap();
        assert!(matches!(set.insert(dup), Err(CurveError::DuplicateCurve { .. })));

        let other = IrCurve::flat("EUR", d(2025, 1, 2), vec![d(2026, 1, 1)], 0.05).unwrap();
        assert!(matches!(set.insert(other), Err(CurveError::BuildDateMismatch { .. })));

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["USD.OIS", "WCS", "WCS.HARDISTY", "WTI"]);
    }

    #[test]
    fn test_basis_price_resolution() {
        let set = sample();
        let date = d(2025, 7, 1);
        assert_relative_eq!(set.price("WTI", date).unwrap(), 70.0);
        assert_relative_eq!(set.price("WCS", date).unwrap(), 60.0);
        assert_relative_eq!(set.price("WCS.HARDISTY", date).unwrap(), 61.0);
        assert_eq!(set.price_chain("WCS.HARDISTY").unwrap(), vec!["WCS.HARDISTY", "WCS", "WTI"]);
        assert!(matches!(set.price("USD.OIS", date), Err(CurveError::WrongCurveKind { .. })));
    }

    #[test]
    fn test_basis_cycle_detected() {
        let build = d(2025, 1, 1);
        let pillars = vec![d(2026, 1, 1)];
        let set = CurveSet::new(build)
            .with_curve(BasisPriceCurve::new("A", "B", build, pillars.clone(), vec![1.0]).unwrap())
            .unwrap()
            .with_curve(BasisPriceCurve::new("B", "A", build, pillars, vec![1.0]).unwrap())
            .unwrap();
        assert!(matches!(set.price("A", build), Err(CurveError::BasisCycle { .. })));
    }

    #[test]
    fn test_freeze_is_a_snapshot() {
        let mut set = sample();
        let frozen = set.freeze();
        set.curve_mut("USD.OIS").unwrap().set_rate(0, 0.10).unwrap();

        let date = d(2025, 7, 1);
        assert!(frozen.discount_factor("USD.OIS", date).unwrap() > set.discount_factor("USD.OIS", date).unwrap());

        let thawed = frozen.thaw();
        assert_relative_eq!(thawed.curve("USD.OIS").unwrap().rate(0).unwrap(), 0.04);
    }

    #[test]
    fn test_fixed_inputs() {
        let mut set = sample();
        assert!(matches!(set.fix("EUR"), Err(CurveError::CurveNotFound { .. })));

        set.fix("USD.OIS").unwrap();
        assert!(set.is_fixed("USD.OIS"));
        assert_eq!(
            set.solvable_curves().map(|c| c.name()).collect::<Vec<_>>(),
            vec!["WCS", "WCS.HARDISTY", "WTI"]
        );
        assert!(set.freeze().thaw().is_fixed("USD.OIS"));

        assert!(set.unfix("USD.OIS"));
        set.fix_all();
        assert_eq!(set.solvable_curves().count(), 0);
        set.remove("WTI");
        assert!(!set.is_fixed("WTI"));
    }

    #[test]
    fn test_vol_surfaces() {
        let set = sample().with_vol_surface(Arc::new(FlatVolSurface::new("WTI.VOL", 0.3)));
        assert_relative_eq!(set.vol_surface("WTI.VOL").unwrap().volatility(70.0, 1.0), 0.3);
        assert!(matches!(set.vol_surface("X"), Err(CurveError::VolSurfaceNotFound { .. })));
    }

    #[test]
    fn test_curve_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CurveSet>();
        assert_send_sync::<FrozenCurveSet>();
    }
}
