//! Pillar storage shared by every curve kind.

use once_cell::sync::OnceCell;
use strata_core::daycounts::DayCountConvention;
use strata_core::types::Date;
use strata_math::interpolation::{Extrapolation, Interpolator, InterpolatorKind};

use crate::error::{CurveError, CurveResult};

/// Named pillar dates and values with a lazily built interpolant.
///
/// Curve time is ACT/365 Fixed from the build date. The interpolant is built
/// on first query and discarded whenever a pillar value changes, so every
/// query sees the current pillars.
#[derive(Debug)]
pub struct Pillars {
    name: String,
    build_date: Date,
    solve_stage: u32,
    dates: Vec<Date>,
    values: Vec<f64>,
    interpolation: InterpolatorKind,
    extrapolation: Extrapolation,
    cache: OnceCell<Box<dyn Interpolator>>,
}

impl Clone for Pillars {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            build_date: self.build_date,
            solve_stage: self.solve_stage,
            dates: self.dates.clone(),
            values: self.values.clone(),
            interpolation: self.interpolation,
            extrapolation: self.extrapolation,
            cache: OnceCell::new(),
        }
    }
}

impl Pillars {
    /// Validates and stores pillars. Dates must be strictly increasing and
    /// not before the build date; values must be finite.
    pub fn new(
        name: impl Into<String>,
        build_date: Date,
        dates: Vec<Date>,
        values: Vec<f64>,
    ) -> CurveResult<Self> {
        let name = name.into();
        if dates.is_empty() {
            return Err(CurveError::InsufficientPillars {
                curve: name,
                required: 1,
                got: 0,
            });
        }
        if dates.len() != values.len() {
            return Err(CurveError::invalid_value(format!(
                "curve '{name}': {} pillar dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if dates[0] < build_date {
            return Err(CurveError::invalid_value(format!(
                "curve '{name}': pillar {} precedes build date {build_date}",
                dates[0]
            )));
        }
        for (index, w) in dates.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(CurveError::NonMonotonicPillars {
                    curve: name,
                    index: index + 1,
                    prev: w[0],
                    current: w[1],
                });
            }
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(CurveError::invalid_value(format!(
                "curve '{name}': non-finite pillar value {bad}"
            )));
        }

        Ok(Self {
            name,
            build_date,
            solve_stage: 0,
            dates,
            values,
            interpolation: InterpolatorKind::Linear,
            extrapolation: Extrapolation::Flat,
            cache: OnceCell::new(),
        })
    }

    /// Curve name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build date.
    pub fn build_date(&self) -> Date {
        self.build_date
    }

    /// Calibration stage.
    pub fn solve_stage(&self) -> u32 {
        self.solve_stage
    }

    /// Pillar dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Pillar values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Interpolation method.
    pub fn interpolation(&self) -> InterpolatorKind {
        self.interpolation
    }

    pub(crate) fn set_solve_stage(&mut self, stage: u32) {
        self.solve_stage = stage;
    }

    pub(crate) fn set_interpolation(&mut self, kind: InterpolatorKind) {
        self.interpolation = kind;
        self.cache = OnceCell::new();
    }

    pub(crate) fn set_extrapolation(&mut self, extrapolation: Extrapolation) {
        self.extrapolation = extrapolation;
        self.cache = OnceCell::new();
    }

    /// Curve time of `date` in years.
    pub fn time(&self, date: Date) -> f64 {
        DayCountConvention::Act365Fixed.year_fraction(self.build_date, date)
    }

    fn check_index(&self, index: usize) -> CurveResult<()> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(CurveError::PillarOutOfRange {
                curve: self.name.clone(),
                index,
                len: self.values.len(),
            })
        }
    }

    /// Value of pillar `index`.
    pub fn get(&self, index: usize) -> CurveResult<f64> {
        self.check_index(index)?;
        Ok(self.values[index])
    }

    /// Overwrites pillar `index` and drops the cached interpolant.
    pub fn set(&mut self, index: usize, value: f64) -> CurveResult<()> {
        self.check_index(index)?;
        if !value.is_finite() {
            return Err(CurveError::invalid_value(format!(
                "curve '{}': non-finite value {value} for pillar {index}",
                self.name
            )));
        }
        self.values[index] = value;
        self.cache = OnceCell::new();
        Ok(())
    }

    fn interpolator(&self) -> CurveResult<&dyn Interpolator> {
        let interp = self.cache.get_or_try_init(|| {
            let times = self.dates.iter().map(|d| self.time(*d)).collect();
            self.interpolation
                .build(times, self.values.clone(), self.extrapolation)
        })?;
        Ok(interp.as_ref())
    }

    /// Interpolated value at `date`.
    pub fn value_at(&self, date: Date) -> CurveResult<f64> {
        Ok(self.interpolator()?.interpolate(self.time(date))?)
    }

    /// Slope of the interpolated value with respect to curve time.
    pub fn slope_at(&self, date: Date) -> CurveResult<f64> {
        Ok(self.interpolator()?.derivative(self.time(date))?)
    }

    /// Per-pillar weights of the interpolated value at `date`.
    pub fn sensitivity(&self, date: Date) -> CurveResult<Vec<f64>> {
        Ok(self.interpolator()?.sensitivity(self.time(date))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_validation() {
        let build = d(2025, 1, 1);
        assert!(matches!(
            Pillars::new("X", build, vec![], vec![]),
            Err(CurveError::InsufficientPillars { .. })
        ));
        assert!(matches!(
            Pillars::new("X", build, vec![d(2025, 6, 1), d(2025, 3, 1)], vec![1.0, 2.0]),
            Err(CurveError::NonMonotonicPillars { index: 1, .. })
        ));
        assert!(Pillars::new("X", build, vec![d(2024, 6, 1)], vec![1.0]).is_err());
        assert!(Pillars::new("X", build, vec![d(2025, 6, 1)], vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_set_invalidates_interpolant() {
        let build = d(2025, 1, 1);
        let mut p = Pillars::new("X", build, vec![d(2026, 1, 1), d(2027, 1, 1)], vec![1.0, 2.0]).unwrap();
        let mid = d(2026, 7, 2);
        let before = p.value_at(mid).unwrap();
        p.set(1, 4.0).unwrap();
        let after = p.value_at(mid).unwrap();
        assert!(after > before);
        assert!(p.set(2, 1.0).is_err());
        assert!(p.set(0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_sensitivity_hat_weights() {
        let build = d(2025, 1, 1);
        let p = Pillars::new("X", build, vec![d(2026, 1, 1), d(2027, 1, 1)], vec![1.0, 2.0]).unwrap();
        let w = p.sensitivity(d(2026, 7, 2)).unwrap();
        assert_relative_eq!(w[0] + w[1], 1.0, epsilon = 1e-14);
        assert_relative_eq!(w[1], 182.0 / 365.0, epsilon = 1e-12);
        // Flat before the first pillar
        assert_eq!(p.sensitivity(build).unwrap(), vec![1.0, 0.0]);
    }
}
