//! Convergence reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// Outcome of a Newton solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Max |PV| fell below the tolerance.
    Converged,
    /// The iteration budget ran out first.
    IterationsExhausted,
    /// The Jacobian could not be solved or a step was not finite; pillars
    /// hold their last finite values.
    Singular,
}

impl SolveStatus {
    /// Whether the solve converged.
    #[must_use]
    pub fn is_converged(self) -> bool {
        self == SolveStatus::Converged
    }

    fn severity(self) -> u8 {
        match self {
            SolveStatus::Converged => 0,
            SolveStatus::IterationsExhausted => 1,
            SolveStatus::Singular => 2,
        }
    }

    /// The more severe of two statuses.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Converged => write!(f, "converged"),
            SolveStatus::IterationsExhausted => write!(f, "iterations exhausted"),
            SolveStatus::Singular => write!(f, "singular"),
        }
    }
}

/// Result of solving one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage index.
    pub stage: u32,
    /// Curves solved in the stage, in solve order.
    pub curves: Vec<String>,
    /// Newton steps taken.
    pub iterations: u32,
    /// Max |PV| of the stage's instruments at exit.
    pub max_abs_pv: f64,
    /// Outcome.
    pub status: SolveStatus,
}

/// Result of a full calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Per-stage results in solve order.
    pub stages: Vec<StageReport>,
    /// Largest iteration count over the stages.
    pub used_iterations: u32,
    /// Worst stage status; `Converged` when there was nothing to solve.
    pub status: SolveStatus,
    /// Tolerance the solve ran with.
    pub tolerance: f64,
    /// Per-stage iteration budget the solve ran with.
    pub max_iterations: u32,
}

impl CalibrationReport {
    /// Builds the summary from stage results.
    #[must_use]
    pub fn new(stages: Vec<StageReport>, tolerance: f64, max_iterations: u32) -> Self {
        let used_iterations = stages.iter().map(|s| s.iterations).max().unwrap_or(0);
        let status = stages
            .iter()
            .fold(SolveStatus::Converged, |acc, s| acc.worst(s.status));
        Self {
            stages,
            used_iterations,
            status,
            tolerance,
            max_iterations,
        }
    }

    /// Whether every stage converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Largest residual over all stages.
    #[must_use]
    pub fn max_abs_pv(&self) -> f64 {
        self.stages.iter().map(|s| s.max_abs_pv).fold(0.0, f64::max)
    }

    /// Report of the stage with index `stage`.
    #[must_use]
    pub fn stage(&self, stage: u32) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Newton steps summed over stages.
    #[must_use]
    pub fn total_iterations(&self) -> u32 {
        self.stages.iter().map(|s| s.iterations).sum()
    }

    /// Turns a non-converged report into [`CurveError::NotConverged`].
    pub fn into_result(self) -> CurveResult<Self> {
        if self.is_converged() {
            Ok(self)
        } else {
            Err(CurveError::NotConverged {
                status: self.status,
                iterations: self.used_iterations,
                max_abs_pv: self.max_abs_pv(),
            })
        }
    }
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Calibration {} ({} iterations)", self.status, self.used_iterations)?;
        for stage in &self.stages {
            writeln!(
                f,
                "  stage {} [{}]: {} after {} iterations, max |PV| {:.2e}",
                stage.stage,
                stage.curves.join(", "),
                stage.status,
                stage.iterations,
                stage.max_abs_pv
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(stage: u32, iterations: u32, status: SolveStatus) -> StageReport {
        StageReport {
            stage,
            curves: vec![format!("C{stage}")],
            iterations,
            max_abs_pv: 1e-3 * f64::from(stage),
            status,
        }
    }

    #[test]
    fn test_worst_status() {
        use SolveStatus::*;
        assert_eq!(Converged.worst(IterationsExhausted), IterationsExhausted);
        assert_eq!(Singular.worst(IterationsExhausted), Singular);
        assert_eq!(Converged.worst(Converged), Converged);
    }

    #[test]
    fn test_report_summary() {
        let report = CalibrationReport::new(
            vec![
                stage(0, 4, SolveStatus::Converged),
                stage(1, 10, SolveStatus::IterationsExhausted),
                stage(2, 2, SolveStatus::Converged),
            ],
            1e-8,
            10,
        );
        assert_eq!(report.used_iterations, 10);
        assert_eq!(report.total_iterations(), 16);
        assert_eq!(report.status, SolveStatus::IterationsExhausted);
        assert!((report.max_abs_pv() - 2e-3).abs() < 1e-15);
        assert_eq!(report.stage(1).unwrap().iterations, 10);

        match report.into_result() {
            Err(CurveError::NotConverged { status, iterations, .. }) => {
                assert_eq!(status, SolveStatus::IterationsExhausted);
                assert_eq!(iterations, 10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_report_converged() {
        let report = CalibrationReport::new(vec![], 1e-8, 1000);
        assert!(report.is_converged());
        assert_eq!(report.used_iterations, 0);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_report_serializes() {
        let report = CalibrationReport::new(vec![stage(0, 3, SolveStatus::Converged)], 1e-8, 1000);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"Converged\""));
    }
}
