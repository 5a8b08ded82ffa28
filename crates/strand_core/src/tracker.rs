//! Path tracking: RK4 predictor, damped-Newton corrector, adaptive step
//! control and per-path failure classification.
//!
//! One path deforms a start solution of `H(x, 0) = 0` into a solution of
//! `H(x, 1) = 0` by integrating the Davidenko ODE
//! `dx/dt = -(dH/dx)^-1 * dH/dt` and pulling every predicted point back onto
//! the solution set with Newton steps at fixed `t`.

pub mod dispatch;
pub mod family;
pub mod types;

pub use dispatch::track_partitioned;
pub use family::{HomotopyFamily, HomotopyParams, SystemEval};
pub use types::{PathSolution, PathStatus, TrackerSettings};

use crate::linear::{self, CVector, SingularMatrix};
use anyhow::{bail, Result};
use num_complex::Complex;
use std::ops::Range;

/// Numerical floor on the remaining distance `1 - t`; a path closer to the
/// target than this is considered arrived.
pub(crate) const T_FLOOR: f64 = 1e-13;

/// Tracks a single path from `t = 0` to `t = 1`.
///
/// Never panics and never returns an error: every outcome, including the
/// degenerate ones, is encoded in the returned solution's status.
pub fn track_path<F, const N: usize, const P: usize>(
    settings: &TrackerSettings,
    start: &CVector<N>,
    params: &HomotopyParams<P>,
) -> PathSolution<N>
where
    F: HomotopyFamily<N, P>,
{
    let mut status = PathStatus::Processing;
    let mut x0 = *start;
    let mut t0 = 0.0_f64;
    let mut dt = settings.init_dt;
    let mut end_zone = false;
    let mut successes = 0u32;
    let mut eval = SystemEval::<N>::zeros();

    while status == PathStatus::Processing && 1.0 - t0 > T_FLOOR {
        // the end zone is entered once and never left
        if !end_zone && 1.0 - t0 <= settings.end_zone_factor + T_FLOOR {
            end_zone = true;
        }
        if end_zone {
            if dt > 1.0 - t0 {
                dt = 1.0 - t0;
            }
        } else if dt > 1.0 - settings.end_zone_factor - t0 {
            dt = 1.0 - settings.end_zone_factor - t0;
        }

        let mut step_singular = false;
        match predict::<F, N, P>(&x0, t0, dt, params, &mut eval) {
            Err(_) => step_singular = true,
            Ok(dx) => {
                let t1 = t0 + dt;
                let mut x1 = x0 + dx;
                match correct::<F, N, P>(settings, &mut x1, t1, params, &mut eval) {
                    Err(_) => step_singular = true,
                    Ok(true) => {
                        x0 = x1;
                        t0 = t1;
                        successes += 1;
                        if successes >= settings.num_successes_before_increase {
                            successes = 0;
                            dt *= settings.dt_increase_factor;
                        }
                    }
                    Ok(false) => {
                        successes = 0;
                        dt *= settings.dt_decrease_factor;
                        if dt < settings.min_dt {
                            status = PathStatus::MinStepFailed;
                        }
                    }
                }
            }
        }

        if x0.norm_squared() > settings.infinity_threshold2 {
            status = PathStatus::InfinityFailed;
        }
        if step_singular {
            status = PathStatus::Singular;
        }
    }

    if status == PathStatus::Processing {
        status = PathStatus::Regular;
    }
    PathSolution { x: x0, t: t0, status }
}

/// Explicit RK4 step of the Davidenko ODE. Returns the increment `dx` such
/// that `x0 + dx` approximates the path at `t0 + dt`, or the first stage's
/// solve failure.
fn predict<F, const N: usize, const P: usize>(
    x0: &CVector<N>,
    t0: f64,
    dt: f64,
    params: &HomotopyParams<P>,
    eval: &mut SystemEval<N>,
) -> Result<CVector<N>, SingularMatrix>
where
    F: HomotopyFamily<N, P>,
{
    let half_dt = Complex::from(0.5 * dt);

    // k1 at (x0, t0)
    F::hxt(x0, t0, params, eval);
    let k1 = linear::solve(eval.jac, eval.rhs)?;

    // k2 at (x0 + k1*dt/2, t0 + dt/2)
    let xt = x0 + k1 * half_dt;
    F::hxt(&xt, t0 + 0.5 * dt, params, eval);
    let k2 = linear::solve(eval.jac, eval.rhs)?;

    // k3 at (x0 + k2*dt/2, t0 + dt/2)
    let xt = x0 + k2 * half_dt;
    F::hxt(&xt, t0 + 0.5 * dt, params, eval);
    let k3 = linear::solve(eval.jac, eval.rhs)?;

    // k4 at (x0 + k3*dt, t0 + dt)
    let xt = x0 + k3 * Complex::from(dt);
    F::hxt(&xt, t0 + dt, params, eval);
    let k4 = linear::solve(eval.jac, eval.rhs)?;

    // dx = dt/6 * (k1 + 2*k2 + 2*k3 + k4)
    let two = Complex::from(2.0);
    Ok((k1 + k2 * two + k3 * two + k4) * Complex::from(dt / 6.0))
}

/// Newton iteration at fixed `t1`. Returns whether the update shrank below
/// the relative tolerance within the iteration budget; a solve failure is
/// surfaced as-is.
fn correct<F, const N: usize, const P: usize>(
    settings: &TrackerSettings,
    x1: &mut CVector<N>,
    t1: f64,
    params: &HomotopyParams<P>,
    eval: &mut SystemEval<N>,
) -> Result<bool, SingularMatrix>
where
    F: HomotopyFamily<N, P>,
{
    for _ in 0..settings.max_corr_steps {
        F::hxh(x1, t1, params, eval);
        let delta = linear::solve(eval.jac, eval.rhs)?;
        *x1 += delta;
        if update_converged(&delta, x1, settings.epsilon2) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Relative convergence test `|delta|^2 < epsilon^2 * |x|^2`; invariant under
/// scaling both arguments by the same nonzero complex constant.
#[inline]
fn update_converged<const N: usize>(delta: &CVector<N>, x: &CVector<N>, epsilon2: f64) -> bool {
    delta.norm_squared() < epsilon2 * x.norm_squared()
}

/// Tracks the paths with indices in `range`, writing each result into the
/// matching output slot. This is the per-worker entry point; the full-range
/// call is [`track_all`].
pub fn track<F, const N: usize, const P: usize>(
    settings: &TrackerSettings,
    start_sols: &[CVector<N>],
    params: &HomotopyParams<P>,
    out: &mut [PathSolution<N>],
    range: Range<usize>,
) -> Result<()>
where
    F: HomotopyFamily<N, P>,
{
    settings.validate()?;
    if start_sols.len() != out.len() {
        bail!(
            "start solution count {} does not match output slot count {}",
            start_sols.len(),
            out.len()
        );
    }
    if range.start > range.end || range.end > out.len() {
        bail!("path range {}..{} out of bounds for {} paths", range.start, range.end, out.len());
    }
    for i in range {
        out[i] = track_path::<F, N, P>(settings, &start_sols[i], params);
    }
    Ok(())
}

/// Tracks every path.
pub fn track_all<F, const N: usize, const P: usize>(
    settings: &TrackerSettings,
    start_sols: &[CVector<N>],
    params: &HomotopyParams<P>,
    out: &mut [PathSolution<N>],
) -> Result<()>
where
    F: HomotopyFamily<N, P>,
{
    let n = out.len();
    track::<F, N, P>(settings, start_sols, params, out, 0..n)
}
