//! Decoding tracked solutions into relative camera poses.
//!
//! A converged solution vector of the trifocal relative-pose family is laid
//! out as `[q12 | q13 | t12 | t13]`: the rotations of views 2 and 3 relative
//! to view 1 as quaternions, followed by the two translations.

use anyhow::{bail, Result};
use nalgebra::{Matrix3, Vector3};
use strand_core::tracker::{PathSolution, PathStatus};

/// Dimension of the relative-pose solution vector.
pub const SOLUTION_DIM: usize = 14;

/// Largest imaginary part a coordinate may carry for the solution to count
/// as real.
pub const IMAG_TOLERANCE: f64 = 1e-5;

/// Pose of one view relative to the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// The two relative poses encoded by one solution; the first camera is the
/// identity by convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPair {
    pub second: RelativePose,
    pub third: RelativePose,
}

/// Rotation matrix of a unit quaternion `[x, y, z, w]` (scalar part last).
pub fn quat_to_rotation(q: &[f64; 4]) -> Matrix3<f64> {
    let x2 = q[0] * q[0];
    let xy = q[0] * q[1];
    let rx = q[3] * q[0];
    let y2 = q[1] * q[1];
    let yz = q[1] * q[2];
    let ry = q[3] * q[1];
    let z2 = q[2] * q[2];
    let zx = q[2] * q[0];
    let rz = q[3] * q[2];
    let r2 = q[3] * q[3];
    Matrix3::new(
        r2 + x2 - y2 - z2,
        2.0 * (xy - rz),
        2.0 * (zx + ry),
        2.0 * (xy + rz),
        r2 - x2 + y2 - z2,
        2.0 * (yz - rx),
        2.0 * (zx - ry),
        2.0 * (yz + rx),
        r2 - x2 - y2 + z2,
    )
}

/// Extracts the real coordinates of a solution, or `None` when any
/// coordinate carries a non-negligible imaginary part.
pub fn real_solution(sol: &PathSolution<SOLUTION_DIM>) -> Option<[f64; SOLUTION_DIM]> {
    let mut rs = [0.0; SOLUTION_DIM];
    for (r, c) in rs.iter_mut().zip(sol.x.iter()) {
        if c.im.abs() >= IMAG_TOLERANCE {
            return None;
        }
        *r = c.re;
    }
    Some(rs)
}

/// Decodes a real solution vector into the two relative poses. The
/// quaternion blocks are normalized first; a vanishing quaternion block is
/// rejected.
pub fn solution_to_cameras(rs: &[f64; SOLUTION_DIM]) -> Result<CameraPair> {
    let q12 = normalized_quat(&[rs[0], rs[1], rs[2], rs[3]])?;
    let q13 = normalized_quat(&[rs[4], rs[5], rs[6], rs[7]])?;
    Ok(CameraPair {
        second: RelativePose {
            rotation: quat_to_rotation(&q12),
            translation: Vector3::new(rs[8], rs[9], rs[10]),
        },
        third: RelativePose {
            rotation: quat_to_rotation(&q13),
            translation: Vector3::new(rs[11], rs[12], rs[13]),
        },
    })
}

/// Decodes every successfully tracked, real solution of a batch, keeping the
/// originating path index of each camera pair.
pub fn solutions_to_cameras(solutions: &[PathSolution<SOLUTION_DIM>]) -> Vec<(usize, CameraPair)> {
    solutions
        .iter()
        .enumerate()
        .filter(|(_, sol)| sol.status == PathStatus::Regular)
        .filter_map(|(i, sol)| {
            let rs = real_solution(sol)?;
            solution_to_cameras(&rs).ok().map(|cams| (i, cams))
        })
        .collect()
}

fn normalized_quat(q: &[f64; 4]) -> Result<[f64; 4]> {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if norm <= 0.0 {
        bail!("quaternion block of the solution vector vanishes");
    }
    Ok([q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm])
}
