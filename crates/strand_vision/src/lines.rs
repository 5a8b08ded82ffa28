//! Visible-line construction from point/tangent correspondences.
//!
//! The trifocal minimal problem observes three points over three views, with
//! usable tangent directions at two of the points. Its parameterization works
//! on homogeneous image lines rather than the raw features: per
//! reconstruction there are 15 of them, the three point-pair lines and the
//! two selected tangent lines, each seen in all three views.

use anyhow::{bail, Result};
use nalgebra::{Vector2, Vector3};

pub const NVIEWS: usize = 3;
pub const NPOINTS: usize = 3;
/// Point-pair lines plus the two tangent lines, over all views.
pub const NLINES: usize = 15;

/// Homogeneous line through two inhomogeneous image points.
pub fn point_pair_line(a: &Vector2<f64>, b: &Vector2<f64>) -> Vector3<f64> {
    let ah = Vector3::new(a.x, a.y, 1.0);
    let bh = Vector3::new(b.x, b.y, 1.0);
    ah.cross(&bh)
}

/// Homogeneous line through `p` along the tangent direction `dir`.
pub fn point_tangent_line(p: &Vector2<f64>, dir: &Vector2<f64>) -> Vector3<f64> {
    let ph = Vector3::new(p.x, p.y, 1.0);
    // direction as a point at infinity
    let dh = Vector3::new(dir.x, dir.y, 0.0);
    ph.cross(&dh)
}

/// Builds the 15-line bundle from per-view points and tangents.
///
/// `points[view][point]` and `tangents[view][point]` hold the features;
/// `id_tgt0` / `id_tgt1` select the two points whose tangents participate.
/// The output is line-major: entries `3*l .. 3*l+3` are line `l` over views
/// 0..3, with lines ordered as the pairs (0,1), (0,2), (1,2) followed by the
/// tangent at `id_tgt0`, then the tangent at `id_tgt1`.
pub fn point_tangents_to_lines(
    points: &[[Vector2<f64>; NPOINTS]; NVIEWS],
    tangents: &[[Vector2<f64>; NPOINTS]; NVIEWS],
    id_tgt0: usize,
    id_tgt1: usize,
) -> Result<[Vector3<f64>; NLINES]> {
    if id_tgt0 >= NPOINTS || id_tgt1 >= NPOINTS {
        bail!("tangent point index out of range");
    }
    if id_tgt0 == id_tgt1 {
        bail!("tangent point indices must be distinct");
    }

    let mut plines = [Vector3::zeros(); NLINES];
    let pairs = [(0, 1), (0, 2), (1, 2)];
    for (l, &(a, b)) in pairs.iter().enumerate() {
        for v in 0..NVIEWS {
            plines[3 * l + v] = point_pair_line(&points[v][a], &points[v][b]);
        }
    }
    for (l, &p) in [id_tgt0, id_tgt1].iter().enumerate() {
        for v in 0..NVIEWS {
            plines[3 * (3 + l) + v] = point_tangent_line(&points[v][p], &tangents[v][p]);
        }
    }
    Ok(plines)
}
