//! The problem-family boundary.
//!
//! Each minimal-problem family (fixed system size, fixed parameter count)
//! supplies the two evaluations the tracker needs: the Jacobian of the
//! homotopy map together with a right-hand side, in predictor form (`hxt`)
//! and corrector form (`hxh`). Families are selected at compile time; the
//! evaluations are pure functions of their arguments.

use crate::linear::{CMatrix, CVector};
use num_complex::Complex;

/// Evaluation buffer a family fills for one linear solve.
///
/// `jac` is `dH/dx` at the evaluation point. `rhs` is stored already negated
/// so the tracker solves `jac * dx = rhs` directly: `-dH/dt` for the
/// predictor, `-H` (the Newton residual) for the corrector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemEval<const N: usize> {
    pub jac: CMatrix<N>,
    pub rhs: CVector<N>,
}

impl<const N: usize> SystemEval<N> {
    pub fn zeros() -> Self {
        Self {
            jac: CMatrix::zeros(),
            rhs: CVector::zeros(),
        }
    }
}

impl<const N: usize> Default for SystemEval<N> {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Start- and target-system parameter vectors of a straight-line homotopy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomotopyParams<const P: usize> {
    pub start: CVector<P>,
    pub target: CVector<P>,
}

impl<const P: usize> HomotopyParams<P> {
    pub fn new(start: CVector<P>, target: CVector<P>) -> Self {
        Self { start, target }
    }

    /// The straight-line blend `(1 - t) * start + t * target`.
    pub fn blend(&self, t: f64) -> CVector<P> {
        self.start * Complex::from(1.0 - t) + self.target * Complex::from(t)
    }

    /// Rate of change of the blend, `target - start`.
    pub fn rate(&self) -> CVector<P> {
        self.target - self.start
    }
}

/// A problem family's evaluator, the external collaborator of the tracker.
///
/// Both functions must be pure: no internal state, identical output for
/// identical input. `N` is the system size, `P` the per-system parameter
/// count of the family.
pub trait HomotopyFamily<const N: usize, const P: usize> {
    /// Predictor-side evaluation at `(x, t)`: fills `jac = dH/dx` and
    /// `rhs = -dH/dt`. Called once per RK4 stage, at intermediate `t` values.
    fn hxt(x: &CVector<N>, t: f64, params: &HomotopyParams<P>, out: &mut SystemEval<N>);

    /// Corrector-side evaluation at `(x, t)`: fills `jac = dH/dx` and
    /// `rhs = -H(x, t)`, the Newton residual at the fixed target `t`.
    fn hxh(x: &CVector<N>, t: f64, params: &HomotopyParams<P>, out: &mut SystemEval<N>);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    #[test]
    fn blend_hits_both_endpoints() {
        let params = HomotopyParams::new(
            CVector::<2>::from([c(1.0, 0.0), c(0.0, 2.0)]),
            CVector::<2>::from([c(-1.0, 1.0), c(4.0, 0.0)]),
        );
        assert_eq!(params.blend(0.0), params.start);
        assert_eq!(params.blend(1.0), params.target);
    }

    #[test]
    fn blend_midpoint_is_average() {
        let params = HomotopyParams::new(
            CVector::<1>::from([c(2.0, -2.0)]),
            CVector::<1>::from([c(4.0, 2.0)]),
        );
        let mid = params.blend(0.5);
        assert!((mid[0] - c(3.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn rate_is_target_minus_start() {
        let params = HomotopyParams::new(
            CVector::<1>::from([c(1.0, 1.0)]),
            CVector::<1>::from([c(3.0, 0.0)]),
        );
        assert_eq!(params.rate()[0], c(2.0, -1.0));
    }
}
