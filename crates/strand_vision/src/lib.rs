//! Geometric shaping around the `strand_core` tracker for trifocal
//! relative-pose estimation: converts point/tangent correspondences into the
//! line bundle a problem family consumes, and decodes converged solution
//! vectors into relative camera poses.

pub mod cameras;
pub mod lines;
