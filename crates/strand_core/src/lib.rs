//! The `strand_core` crate is the numerical engine for solving minimal
//! problems by homotopy continuation: a known start system is deformed into
//! the target system along `t` in `[0, 1]` and every start solution is
//! tracked to a target solution (or a classified failure).
//!
//! Key components:
//! - **Linear**: dense complex `N x N` solve, monomorphized per system size.
//! - **Tracker**: the RK4 predictor / Newton corrector loop with adaptive
//!   step control, plus the settings and per-path state types.
//! - **Dispatch**: fan-out of independent paths over worker threads.

pub mod linear;
pub mod tracker;
