//! Staged Newton-Raphson calibration.
//!
//! # Algorithm
//!
//! 1. Partition the targeted curves into stages (see [`StagePartition`]) and
//!    validate the problem: unknown curves, non-square stages, stage-order
//!    violations and missing analytic sensitivities fail here, before any
//!    iteration runs.
//! 2. For each stage in ascending order:
//!    - price the stage's instruments
//!    - stop if max |PV| is below the tolerance
//!    - build the Jacobian (bump-and-revalue or analytic)
//!    - solve `Jᵀ Δ = PV` and move the pillars to `guess - Δ`
//! 3. Report per-stage status; non-convergence is a status, not an error.
//!
//! Later stages see earlier stages' curves in their final state.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_curves::prelude::*;
//!
//! let mut solver = MultiCurveSolver::analytic();
//! let report = solver.solve(&mut curves, &instruments)?;
//! if !report.is_converged() {
//!     tracing::warn!(%report, "calibration incomplete");
//! }
//! ```

mod config;
mod jacobian;
mod multi_curve;
mod newton;
mod report;
mod single;
mod stage;

pub use config::{
    CalibrationConfig, JacobianMethod, DEFAULT_BUMP, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
pub use jacobian::{analytic_jacobian, numerical_jacobian, stage_pvs};
pub use multi_curve::MultiCurveSolver;
pub use report::{CalibrationReport, SolveStatus, StageReport};
pub use single::{SingleCurveSolver, SolvedCurve};
pub use stage::{PillarRef, Stage, StagePartition};
