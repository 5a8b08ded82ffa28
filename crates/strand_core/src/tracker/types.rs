//! Settings and per-path state for the tracker.

use crate::linear::CVector;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Tunables of the predictor-corrector loop.
///
/// The squared forms `epsilon2` and `infinity_threshold2` are stored alongside
/// their roots so the inner loop compares squared norms without taking roots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Step size a path starts with.
    pub init_dt: f64,
    /// Lower bound on the step size before the path gives up.
    pub min_dt: f64,
    /// Distance to `t = 1` at which the step-clipping policy switches to the
    /// conservative final approach.
    pub end_zone_factor: f64,
    /// Corrector convergence tolerance.
    pub epsilon: f64,
    /// `epsilon * epsilon`, the form the corrector actually tests against.
    pub epsilon2: f64,
    /// Newton iterations allowed per corrector invocation.
    pub max_corr_steps: u32,
    /// Step growth applied after enough consecutive successes.
    pub dt_increase_factor: f64,
    /// Step shrink applied after a corrector failure.
    pub dt_decrease_factor: f64,
    /// Consecutive corrector successes required before the step grows.
    pub num_successes_before_increase: u32,
    /// Solution magnitude past which a path is declared divergent.
    pub infinity_threshold: f64,
    /// `infinity_threshold * infinity_threshold`.
    pub infinity_threshold2: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        let epsilon = 1e-6;
        let infinity_threshold = 1e7;
        Self {
            init_dt: 0.05,
            min_dt: 1e-7,
            end_zone_factor: 0.05,
            epsilon,
            epsilon2: epsilon * epsilon,
            max_corr_steps: 3,
            dt_increase_factor: 2.0,
            dt_decrease_factor: 0.5,
            num_successes_before_increase: 20,
            infinity_threshold,
            infinity_threshold2: infinity_threshold * infinity_threshold,
        }
    }
}

impl TrackerSettings {
    /// Checks the relations the tracking loop relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_dt > 0.0 && self.min_dt < self.init_dt) {
            bail!("step sizes must satisfy 0 < min_dt < init_dt");
        }
        if !(self.dt_decrease_factor < 1.0 && self.dt_increase_factor > 1.0) {
            bail!("step factors must satisfy dt_decrease_factor < 1 < dt_increase_factor");
        }
        if self.epsilon <= 0.0 || self.epsilon2 <= 0.0 {
            bail!("corrector tolerance must be positive");
        }
        if self.max_corr_steps == 0 {
            bail!("at least one corrector step is required");
        }
        if !(0.0..=1.0).contains(&self.end_zone_factor) {
            bail!("end_zone_factor must lie in [0, 1]");
        }
        if self.infinity_threshold2 <= 0.0 {
            bail!("infinity threshold must be positive");
        }
        Ok(())
    }
}

/// Lifecycle of one tracked path.
///
/// A path is created `Undetermined`, runs as `Processing` and ends in exactly
/// one terminal state, of which `Regular` is the only success.
/// `OriginFailed`, `IncreasePrecision` and `DecreasePrecision` are reserved
/// states that the current algorithm never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    Undetermined,
    Processing,
    /// Reached `t = 1` with a converged solution.
    Regular,
    /// A predictor or corrector linear solve hit a degenerate Jacobian.
    Singular,
    /// Solution norm crossed the divergence threshold.
    InfinityFailed,
    /// Repeated corrector failures shrank the step below `min_dt`.
    MinStepFailed,
    OriginFailed,
    IncreasePrecision,
    DecreasePrecision,
}

impl PathStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PathStatus::Undetermined | PathStatus::Processing)
    }

    pub fn is_success(self) -> bool {
        self == PathStatus::Regular
    }
}

/// Final record of one path: the last point reached and how tracking ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSolution<const N: usize> {
    pub x: CVector<N>,
    /// Last homotopy parameter reached, in `[0, 1]`.
    pub t: f64,
    pub status: PathStatus,
}

impl<const N: usize> Default for PathSolution<N> {
    fn default() -> Self {
        Self {
            x: CVector::zeros(),
            t: 0.0,
            status: PathStatus::Undetermined,
        }
    }
}
