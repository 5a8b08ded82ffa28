//! End-to-end tracking runs against small closed-form homotopy families.

use num_complex::Complex;
use strand_core::linear::{CMatrix, CVector};
use strand_core::tracker::{
    track, track_all, track_partitioned, track_path, HomotopyFamily, HomotopyParams, PathSolution,
    PathStatus, SystemEval, TrackerSettings,
};

type C64 = Complex<f64>;

fn c(re: f64, im: f64) -> C64 {
    C64::new(re, im)
}

/// Decoupled square-root family: `H_i(x, t) = x_i^2 - p_i(t)` with the
/// straight-line parameter blend. Each path follows `x_i(t) = sqrt(p_i(t))`
/// on the branch it started on; for parameter segments staying in the right
/// half-plane the endpoint is the principal root of the target parameter.
struct SquareRoot;

impl HomotopyFamily<2, 2> for SquareRoot {
    fn hxt(x: &CVector<2>, _t: f64, params: &HomotopyParams<2>, out: &mut SystemEval<2>) {
        let rate = params.rate();
        out.jac = CMatrix::zeros();
        for i in 0..2 {
            out.jac[(i, i)] = x[i] * 2.0;
            out.rhs[i] = rate[i];
        }
    }

    fn hxh(x: &CVector<2>, t: f64, params: &HomotopyParams<2>, out: &mut SystemEval<2>) {
        let p = params.blend(t);
        out.jac = CMatrix::zeros();
        for i in 0..2 {
            out.jac[(i, i)] = x[i] * 2.0;
            out.rhs[i] = p[i] - x[i] * x[i];
        }
    }
}

fn square_root_params() -> HomotopyParams<2> {
    HomotopyParams::new(
        CVector::<2>::from([c(4.0, 0.0), c(9.0, 0.0)]),
        CVector::<2>::from([c(1.0, 1.0), c(2.0, -1.0)]),
    )
}

fn square_root_starts() -> Vec<CVector<2>> {
    vec![
        CVector::<2>::from([c(2.0, 0.0), c(3.0, 0.0)]),
        CVector::<2>::from([c(-2.0, 0.0), c(-3.0, 0.0)]),
        CVector::<2>::from([c(2.0, 0.0), c(-3.0, 0.0)]),
        CVector::<2>::from([c(-2.0, 0.0), c(3.0, 0.0)]),
    ]
}

/// Expected endpoint of a square-root path: the target root on the same
/// branch as the start value.
fn square_root_target(start: &CVector<2>, params: &HomotopyParams<2>) -> CVector<2> {
    let mut expected = CVector::<2>::zeros();
    for i in 0..2 {
        let principal = params.target[i].sqrt();
        expected[i] = if start[i].re >= 0.0 { principal } else { -principal };
    }
    expected
}

/// One-dimensional pole family: `H(x, t) = ((1 - t) + e) * x - 1` with a tiny
/// `e`, so the tracked solution `x(t) = 1 / ((1 - t) + e)` blows up on the
/// final approach while the Jacobian stays invertible.
struct Pole;

const POLE_OFFSET: f64 = 1e-9;

impl HomotopyFamily<1, 1> for Pole {
    fn hxt(x: &CVector<1>, t: f64, _params: &HomotopyParams<1>, out: &mut SystemEval<1>) {
        out.jac[(0, 0)] = c((1.0 - t) + POLE_OFFSET, 0.0);
        // dH/dt = -x, negated for the solve
        out.rhs[0] = x[0];
    }

    fn hxh(x: &CVector<1>, t: f64, _params: &HomotopyParams<1>, out: &mut SystemEval<1>) {
        let scale = c((1.0 - t) + POLE_OFFSET, 0.0);
        out.jac[(0, 0)] = scale;
        out.rhs[0] = c(1.0, 0.0) - scale * x[0];
    }
}

/// Family whose corrector never converges: the Newton update is a constant of
/// magnitude one, so every step attempt fails and the step size shrinks until
/// it collapses.
struct Stubborn;

impl HomotopyFamily<1, 1> for Stubborn {
    fn hxt(_x: &CVector<1>, _t: f64, _params: &HomotopyParams<1>, out: &mut SystemEval<1>) {
        out.jac[(0, 0)] = c(1.0, 0.0);
        out.rhs[0] = c(0.0, 0.0);
    }

    fn hxh(_x: &CVector<1>, _t: f64, _params: &HomotopyParams<1>, out: &mut SystemEval<1>) {
        out.jac[(0, 0)] = c(1.0, 0.0);
        out.rhs[0] = c(1.0, 0.0);
    }
}

fn scalar_params() -> HomotopyParams<1> {
    HomotopyParams::new(
        CVector::<1>::from([c(1.0, 0.0)]),
        CVector::<1>::from([c(1.0, 0.0)]),
    )
}

#[test]
fn regular_paths_reach_target_roots() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let starts = square_root_starts();
    let mut out = vec![PathSolution::<2>::default(); starts.len()];

    track_all::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out).unwrap();

    for (start, sol) in starts.iter().zip(&out) {
        assert_eq!(sol.status, PathStatus::Regular);
        assert!(sol.t <= 1.0);
        assert!(1.0 - sol.t <= 1e-13);
        let expected = square_root_target(start, &params);
        assert!(
            (sol.x - expected).norm() < 1e-5,
            "endpoint {:?} too far from {:?}",
            sol.x,
            expected
        );
    }
}

#[test]
fn zero_jacobian_at_start_marks_path_singular() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let start = CVector::<2>::zeros();

    let sol = track_path::<SquareRoot, 2, 2>(&settings, &start, &params);

    assert_eq!(sol.status, PathStatus::Singular);
    assert_eq!(sol.t, 0.0);
    assert_eq!(sol.x, start);
}

#[test]
fn diverging_path_fails_at_infinity() {
    let settings = TrackerSettings::default();
    let params = scalar_params();
    let start = CVector::<1>::from([c(1.0 / (1.0 + POLE_OFFSET), 0.0)]);

    let sol = track_path::<Pole, 1, 1>(&settings, &start, &params);

    assert_eq!(sol.status, PathStatus::InfinityFailed);
    assert!(sol.x.norm_squared() > settings.infinity_threshold2);
    assert!(sol.t > 0.99);
}

#[test]
fn stalled_corrector_fails_at_min_step() {
    let settings = TrackerSettings::default();
    let params = scalar_params();
    let start = CVector::<1>::from([c(0.5, 0.0)]);

    let sol = track_path::<Stubborn, 1, 1>(&settings, &start, &params);

    assert_eq!(sol.status, PathStatus::MinStepFailed);
    assert!(sol.t < 1.0);
    assert_eq!(sol.t, 0.0);
    assert_eq!(sol.x, start);
}

#[test]
fn end_zone_branch_taken_at_exact_boundary() {
    // with end_zone_factor = 1 the very first iteration sits exactly at
    // t0 = 1 - end_zone_factor; only the end-zone clipping policy lets the
    // step advance at all
    let settings = TrackerSettings {
        end_zone_factor: 1.0,
        ..TrackerSettings::default()
    };
    let params = square_root_params();
    let starts = square_root_starts();

    let sol = track_path::<SquareRoot, 2, 2>(&settings, &starts[0], &params);

    assert_eq!(sol.status, PathStatus::Regular);
    assert!(1.0 - sol.t <= 1e-13);
    let expected = square_root_target(&starts[0], &params);
    assert!((sol.x - expected).norm() < 1e-5);
}

#[test]
fn partitioned_runs_match_full_run_exactly() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let starts = square_root_starts();
    let n = starts.len();

    let mut full = vec![PathSolution::<2>::default(); n];
    track_all::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut full).unwrap();

    // split sequential runs over arbitrary cut points
    for k in 0..=n {
        let mut split = vec![PathSolution::<2>::default(); n];
        track::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut split, 0..k).unwrap();
        track::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut split, k..n).unwrap();
        assert_eq!(split, full);
    }

    // worker partitions
    for partitions in [1, 2, 4] {
        let mut parallel = vec![PathSolution::<2>::default(); n];
        track_partitioned::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut parallel, partitions)
            .unwrap();
        assert_eq!(parallel, full);
    }
}

#[test]
fn evaluator_is_idempotent() {
    let params = square_root_params();
    let x = CVector::<2>::from([c(1.7, -0.3), c(0.2, 2.1)]);

    let mut first = SystemEval::<2>::zeros();
    let mut second = SystemEval::<2>::zeros();
    SquareRoot::hxt(&x, 0.37, &params, &mut first);
    SquareRoot::hxt(&x, 0.37, &params, &mut second);
    assert_eq!(first, second);

    SquareRoot::hxh(&x, 0.37, &params, &mut first);
    SquareRoot::hxh(&x, 0.37, &params, &mut second);
    assert_eq!(first, second);
}

#[test]
fn mixed_batch_keeps_per_path_outcomes() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let starts = vec![
        CVector::<2>::from([c(2.0, 0.0), c(3.0, 0.0)]),
        CVector::<2>::zeros(),
    ];
    let mut out = vec![PathSolution::<2>::default(); 2];

    track_all::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out).unwrap();

    assert_eq!(out[0].status, PathStatus::Regular);
    assert_eq!(out[1].status, PathStatus::Singular);
}

#[test]
fn entry_points_reject_malformed_input() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let starts = square_root_starts();
    let mut out = vec![PathSolution::<2>::default(); starts.len()];

    // mismatched lengths
    let mut short = vec![PathSolution::<2>::default(); 2];
    assert!(track_all::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut short).is_err());

    // out-of-bounds range
    assert!(track::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out, 2..9).is_err());

    // partition count not dividing the path count
    assert!(
        track_partitioned::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out, 3).is_err()
    );
    assert!(
        track_partitioned::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out, 0).is_err()
    );

    // inconsistent settings
    let bad = TrackerSettings {
        min_dt: 1.0,
        ..TrackerSettings::default()
    };
    assert!(track_all::<SquareRoot, 2, 2>(&bad, &starts, &params, &mut out).is_err());
}

#[test]
fn empty_batch_is_a_no_op() {
    let settings = TrackerSettings::default();
    let params = square_root_params();
    let starts: Vec<CVector<2>> = Vec::new();
    let mut out: Vec<PathSolution<2>> = Vec::new();

    track_all::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out).unwrap();
    track_partitioned::<SquareRoot, 2, 2>(&settings, &starts, &params, &mut out, 1).unwrap();
}
