//! Stage partitioning.
//!
//! Every curve in the set joins the stage given by its
//! [`solve_stage`](crate::curves::PillarCurve::solve_stage), and each
//! instrument joins the stage of its solve curve. A stage must have exactly
//! as many instruments as pillars. Curves marked with
//! [`CurveSet::fix`] are inputs and belong to no stage.
//!
//! Ordering is deterministic:
//!
//! - stages ascending by index
//! - curves by name inside a stage
//! - pillars ascending inside a curve
//! - instruments in input order
//!
//! The curve/pillar order fixes the unknown vector and the Jacobian rows;
//! the instrument order fixes the equations.

use std::collections::BTreeMap;

use super::JacobianMethod;
use crate::curves::{MarketCurve, PillarCurve};
use crate::error::{CurveError, CurveResult};
use crate::instruments::{CalibrationInstrument, InstrumentSet};
use crate::market::CurveSet;

/// One unknown: a pillar of a named curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PillarRef {
    /// Curve name.
    pub curve: String,
    /// Pillar index within the curve.
    pub pillar: usize,
}

/// A square system of pillars and instruments solved together.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    index: u32,
    curves: Vec<String>,
    offsets: Vec<usize>,
    pillars: Vec<PillarRef>,
    instruments: Vec<usize>,
}

impl Stage {
    /// Stage index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Curves solved in this stage, by name.
    pub fn curves(&self) -> &[String] {
        &self.curves
    }

    /// Unknowns in order.
    pub fn pillars(&self) -> &[PillarRef] {
        &self.pillars
    }

    /// Positions in the instrument set of this stage's instruments.
    pub fn instruments(&self) -> &[usize] {
        &self.instruments
    }

    /// Number of unknowns (equal to the number of instruments).
    pub fn size(&self) -> usize {
        self.pillars.len()
    }

    /// Position of `curve`'s first pillar in the unknown vector.
    pub fn offset(&self, curve: &str) -> Option<usize> {
        self.curves
            .iter()
            .position(|c| c == curve)
            .map(|i| self.offsets[i])
    }
}

/// Stages of a calibration problem in solve order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StagePartition {
    stages: Vec<Stage>,
}

impl StagePartition {
    /// Partitions and validates a calibration problem.
    ///
    /// Fails before any pricing when:
    ///
    /// - an instrument names a curve missing from the set
    /// - an instrument targets a fixed curve
    /// - a stage's pillar count differs from its instrument count
    /// - an instrument reads a curve solved in a later stage
    /// - `method` is analytic and an instrument has no analytic sensitivities
    pub fn build(curves: &CurveSet, instruments: &InstrumentSet, method: JacobianMethod) -> CurveResult<Self> {
        // stage -> (curves, instrument positions)
        let mut grouped: BTreeMap<u32, (Vec<&str>, Vec<usize>)> = BTreeMap::new();
        for curve in curves.solvable_curves() {
            grouped.entry(curve.solve_stage()).or_default().0.push(curve.name());
        }

        for (position, instrument) in instruments.iter().enumerate() {
            let target = curves.curve(instrument.solve_curve())?;
            for name in instrument.curve_names() {
                curves.curve(name)?;
            }
            if curves.is_fixed(target.name()) {
                return Err(CurveError::invalid_instrument(format!(
                    "{} targets fixed input curve {}",
                    instrument.description(),
                    target.name()
                )));
            }
            if method == JacobianMethod::Analytic && !instrument.has_analytic_sensitivities() {
                return Err(CurveError::sensitivities_unavailable(instrument.description()));
            }
            grouped.entry(target.solve_stage()).or_default().1.push(position);
        }

        let mut stages = Vec::with_capacity(grouped.len());
        for (index, (names, positions)) in grouped {
            let mut stage = Stage {
                index,
                curves: Vec::with_capacity(names.len()),
                offsets: Vec::with_capacity(names.len()),
                pillars: Vec::new(),
                instruments: positions,
            };
            for name in names {
                let curve = curves.curve(name)?;
                stage.curves.push(name.to_string());
                stage.offsets.push(stage.pillars.len());
                stage.pillars.extend((0..curve.number_of_pillars()).map(|pillar| PillarRef {
                    curve: name.to_string(),
                    pillar,
                }));
            }
            if stage.pillars.len() != stage.instruments.len() {
                return Err(CurveError::stage_mismatch(
                    index,
                    stage.pillars.len(),
                    stage.instruments.len(),
                ));
            }
            stages.push(stage);
        }

        let partition = Self { stages };
        partition.check_stage_order(curves, instruments)?;
        Ok(partition)
    }

    fn solved_stage_of(&self, curve: &str) -> Option<u32> {
        self.stages
            .iter()
            .find(|s| s.curves.iter().any(|c| c == curve))
            .map(|s| s.index)
    }

    fn check_stage_order(&self, curves: &CurveSet, instruments: &InstrumentSet) -> CurveResult<()> {
        for stage in &self.stages {
            for &position in &stage.instruments {
                let Some(instrument) = instruments.get(position) else {
                    continue;
                };
                for name in referenced_curves(curves, instrument)? {
                    if let Some(curve_stage) = self.solved_stage_of(name) {
                        if curve_stage > stage.index {
                            return Err(CurveError::StageOrderViolation {
                                instrument: instrument.description(),
                                curve: name.to_string(),
                                instrument_stage: stage.index,
                                curve_stage,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Keeps only stages with index at most `max_stage`.
    #[must_use]
    pub fn up_to(mut self, max_stage: u32) -> Self {
        self.stages.retain(|s| s.index <= max_stage);
        self
    }

    /// Stages in solve order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there is nothing to solve.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Curves an instrument reads, with basis curves expanded to their bases.
fn referenced_curves<'a>(
    curves: &'a CurveSet,
    instrument: &'a dyn CalibrationInstrument,
) -> CurveResult<Vec<&'a str>> {
    let mut names = Vec::new();
    for name in instrument.curve_names() {
        match curves.curve(name)? {
            MarketCurve::BasisPrice(_) => names.extend(curves.price_chain(name)?),
            _ => names.push(name),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{BasisPriceCurve, IrCurve, PriceCurve};
    use crate::instruments::{AssetForward, Cds, Deposit, Fra};
    use strata_core::types::Date;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn curves() -> CurveSet {
        let build = d(2025, 1, 15);
        CurveSet::new(build)
            .with_curve(IrCurve::flat("OIS", build, vec![d(2025, 4, 15), d(2025, 7, 15)], 0.04).unwrap().with_solve_stage(1))
            .unwrap()
            .with_curve(IrCurve::flat("LIBOR", build, vec![d(2025, 4, 15), d(2025, 7, 15)], 0.05).unwrap())
            .unwrap()
            .with_curve(IrCurve::flat("EUR", build, vec![d(2025, 4, 15)], 0.03).unwrap())
            .unwrap()
            .with_curve(IrCurve::flat("GBP", build, vec![d(2026, 1, 15)], 0.04).unwrap().with_solve_stage(5))
            .unwrap()
    }

    #[test]
    fn test_deterministic_ordering() {
        let build = d(2025, 1, 15);
        let instruments = InstrumentSet::new()
            .with(Deposit::new("OIS", build, d(2025, 4, 15), 0.04))
            .with(Deposit::new("LIBOR", build, d(2025, 4, 15), 0.05))
            .with(Deposit::new("EUR", build, d(2025, 4, 15), 0.03))
            .with(Deposit::new("OIS", build, d(2025, 7, 15), 0.04))
            .with(Deposit::new("LIBOR", build, d(2025, 7, 15), 0.05));

        let set = curves().with_fixed("GBP").unwrap();
        let partition = StagePartition::build(&set, &instruments, JacobianMethod::Numerical).unwrap();
        assert_eq!(partition.len(), 2);

        let stage0 = &partition.stages()[0];
        assert_eq!(stage0.index(), 0);
        assert_eq!(stage0.curves(), ["EUR", "LIBOR"]);
        assert_eq!(stage0.offset("LIBOR"), Some(1));
        assert_eq!(stage0.instruments(), [1, 2, 4]);
        assert_eq!(
            stage0.pillars()[2],
            PillarRef {
                curve: "LIBOR".to_string(),
                pillar: 1
            }
        );

        let stage1 = &partition.stages()[1];
        assert_eq!(stage1.curves(), ["OIS"]);
        assert_eq!(stage1.instruments(), [0, 3]);

        // GBP is fixed: an input, not an unknown
        assert!(partition.stages().iter().all(|s| s.offset("GBP").is_none()));
        assert_eq!(partition.up_to(0).len(), 1);
    }

    #[test]
    fn test_non_square_stage() {
        let build = d(2025, 1, 15);
        let instruments = InstrumentSet::new().with(Deposit::new("LIBOR", build, d(2025, 4, 15), 0.05));
        let err = StagePartition::build(&curves(), &instruments, JacobianMethod::Numerical).unwrap_err();
        // EUR has no instruments but still counts towards stage 0
        assert_eq!(err, CurveError::stage_mismatch(0, 3, 1));
    }

    #[test]
    fn test_stage_without_instruments() {
        let build = d(2025, 1, 15);
        let stage_zero_only = InstrumentSet::new()
            .with(Deposit::new("EUR", build, d(2025, 4, 15), 0.03))
            .with(Deposit::new("LIBOR", build, d(2025, 4, 15), 0.05))
            .with(Deposit::new("LIBOR", build, d(2025, 7, 15), 0.05));
        let err = StagePartition::build(&curves(), &stage_zero_only, JacobianMethod::Numerical).unwrap_err();
        assert_eq!(err, CurveError::stage_mismatch(1, 2, 0));

        let set = curves().with_fixed("OIS").unwrap().with_fixed("GBP").unwrap();
        let partition = StagePartition::build(&set, &stage_zero_only, JacobianMethod::Numerical).unwrap();
        assert_eq!(partition.len(), 1);
    }

    #[test]
    fn test_fixed_curve_cannot_be_targeted() {
        let build = d(2025, 1, 15);
        let set = curves().with_fixed("EUR").unwrap();
        let instruments = InstrumentSet::new().with(Deposit::new("EUR", build, d(2025, 4, 15), 0.03));
        assert!(matches!(
            StagePartition::build(&set, &instruments, JacobianMethod::Numerical),
            Err(CurveError::InvalidInstrument { .. })
        ));
    }

    #[test]
    fn test_unknown_curves() {
        let build = d(2025, 1, 15);
        let missing_target = InstrumentSet::new().with(Deposit::new("JPY", build, d(2025, 4, 15), 0.0));
        assert!(matches!(
            StagePartition::build(&curves(), &missing_target, JacobianMethod::Numerical),
            Err(CurveError::CurveNotFound { .. })
        ));

        let missing_discount = InstrumentSet::new().with(Fra::new("EUR", "ESTR", d(2025, 1, 17), d(2025, 4, 17), 0.03));
        assert!(matches!(
            StagePartition::build(&curves(), &missing_discount, JacobianMethod::Numerical),
            Err(CurveError::CurveNotFound { .. })
        ));
    }

    #[test]
    fn test_stage_order_violation() {
        let build = d(2025, 1, 15);
        // EUR (stage 0) discounted on OIS (solved in stage 1)
        let instruments = InstrumentSet::new()
            .with(Fra::new("EUR", "OIS", d(2025, 1, 17), d(2025, 4, 15), 0.03))
            .with(Deposit::new("OIS", build, d(2025, 4, 15), 0.04))
            .with(Deposit::new("OIS", build, d(2025, 7, 15), 0.04));
        let set = curves().with_fixed("LIBOR").unwrap().with_fixed("GBP").unwrap();
        assert!(matches!(
            StagePartition::build(&set, &instruments, JacobianMethod::Numerical),
            Err(CurveError::StageOrderViolation { instrument_stage: 0, curve_stage: 1, .. })
        ));

        // Reading a fixed later-stage curve is fine
        let fixed_input = InstrumentSet::new().with(Fra::new("EUR", "GBP", d(2025, 1, 17), d(2025, 4, 15), 0.03));
        let set = set.with_fixed("OIS").unwrap();
        assert!(StagePartition::build(&set, &fixed_input, JacobianMethod::Numerical).is_ok());
    }

    #[test]
    fn test_stage_order_through_basis_chain() {
        let build = d(2025, 1, 15);
        let pillars = vec![d(2025, 6, 1)];
        let set = CurveSet::new(build)
            .with_curve(PriceCurve::new("WTI", build, pillars.clone(), vec![70.0]).unwrap().with_solve_stage(2))
            .unwrap()
            .with_curve(BasisPriceCurve::new("WCS", "WTI", build, pillars, vec![-10.0]).unwrap().with_solve_stage(1))
            .unwrap();
        let instruments = InstrumentSet::new()
            .with(AssetForward::new("WCS", d(2025, 6, 1), 60.0))
            .with(AssetForward::new("WTI", d(2025, 6, 1), 70.0));
        assert!(matches!(
            StagePartition::build(&set, &instruments, JacobianMethod::Numerical),
            Err(CurveError::StageOrderViolation { .. })
        ));
    }

    #[test]
    fn test_analytic_requires_sensitivities() {
        let build = d(2025, 1, 15);
        let mut set = curves();
        set.fix_all();
        set.insert(crate::curves::HazardCurve::new("ACME", build, vec![d(2026, 1, 15)], vec![0.01]).unwrap())
            .unwrap();
        let instruments = InstrumentSet::new().with(Cds::new("ACME", "LIBOR", build, d(2026, 1, 15), 0.01));
        assert!(StagePartition::build(&set, &instruments, JacobianMethod::Numerical).is_ok());
        assert!(matches!(
            StagePartition::build(&set, &instruments, JacobianMethod::Analytic),
            Err(CurveError::SensitivitiesUnavailable { .. })
        ));
    }
}
