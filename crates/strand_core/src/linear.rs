//! Dense complex linear solve for one right-hand side.
//!
//! The tracker performs one solve per predictor stage and one per corrector
//! iteration, so everything here is monomorphized for the compile-time system
//! size `N` and runs without heap allocation.

use nalgebra::{SMatrix, SVector};
use num_complex::Complex;
use thiserror::Error;

/// Square complex matrix of the fixed system size.
pub type CMatrix<const N: usize> = SMatrix<Complex<f64>, N, N>;
/// Complex vector of the fixed system size.
pub type CVector<const N: usize> = SVector<Complex<f64>, N>;

/// Squared pivot magnitude at or below which the matrix is declared singular.
///
/// Covers an exactly zero pivot as well as pivots small enough that the
/// elimination would amplify noise past any usable precision.
pub const PIVOT_TOLERANCE2: f64 = 1e-28;

/// Failure signal of [`solve`]: elimination hit a degenerate pivot.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("singular system: pivot magnitude {pivot_norm:e} at column {col}")]
pub struct SingularMatrix {
    /// Column at which elimination stopped.
    pub col: usize,
    /// Magnitude of the offending pivot.
    pub pivot_norm: f64,
}

/// Solves `A x = b` by Gaussian elimination with disparity-triggered pivoting.
///
/// Row swaps are not chosen by maximum magnitude: column `k` is scanned from
/// the bottom row upward and the first row `j` whose entry satisfies
/// `|A[j,k]|^2 > 1000 * |A[k,k]|^2` replaces the diagonal pivot. A swap
/// therefore only happens on a three-orders-of-magnitude disparity, which
/// keeps the common well-conditioned case swap-free.
#[inline]
pub fn solve<const N: usize>(
    mut a: CMatrix<N>,
    mut b: CVector<N>,
) -> Result<CVector<N>, SingularMatrix> {
    for k in 0..N {
        let mut pivot2 = a[(k, k)].norm_sqr();
        for j in (k + 1..N).rev() {
            if a[(j, k)].norm_sqr() > 1000.0 * pivot2 {
                a.swap_rows(k, j);
                b.swap_rows(k, j);
                pivot2 = a[(k, k)].norm_sqr();
                break;
            }
        }
        if pivot2 <= PIVOT_TOLERANCE2 {
            return Err(SingularMatrix {
                col: k,
                pivot_norm: pivot2.sqrt(),
            });
        }

        let pivot = a[(k, k)];
        for j in k + 1..N {
            let factor = a[(j, k)] / pivot;
            for c in k + 1..N {
                let head = a[(k, c)];
                a[(j, c)] -= factor * head;
            }
            let bk = b[k];
            b[j] -= factor * bk;
        }
    }

    // back substitution on the upper triangle
    let mut x = b;
    for k in (0..N).rev() {
        let mut acc = x[k];
        for c in k + 1..N {
            acc -= a[(k, c)] * x[c];
        }
        x[k] = acc / a[(k, k)];
    }
    Ok(x)
}
