//! Fan-out of independent paths over worker threads.
//!
//! Paths share nothing but read-only inputs and each output slot is written
//! by exactly one worker, so the split needs no synchronization beyond the
//! join that [`track_partitioned`] performs before returning.

use super::family::{HomotopyFamily, HomotopyParams};
use super::types::{PathSolution, TrackerSettings};
use super::track_path;
use crate::linear::CVector;
use anyhow::{bail, Result};
use rayon::prelude::*;

/// Splits the path index range into `partitions` contiguous, equal-size
/// chunks and tracks each chunk on its own worker, blocking until all finish.
///
/// Results are identical to a sequential [`super::track_all`] run: per-path
/// arithmetic does not depend on the partitioning.
pub fn track_partitioned<F, const N: usize, const P: usize>(
    settings: &TrackerSettings,
    start_sols: &[CVector<N>],
    params: &HomotopyParams<P>,
    out: &mut [PathSolution<N>],
    partitions: usize,
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
    if partitions == 0 {
        bail!("partition count must be positive");
    }
    if out.len() % partitions != 0 {
        bail!(
            "partition count {} does not evenly divide {} paths",
            partitions,
            out.len()
        );
    }
    if out.is_empty() {
        return Ok(());
    }

    let chunk = out.len() / partitions;
    out.par_chunks_mut(chunk)
        .zip(start_sols.par_chunks(chunk))
        .for_each(|(slots, starts)| {
            for (slot, start) in slots.iter_mut().zip(starts) {
                *slot = track_path::<F, N, P>(settings, start, params);
            }
        });
    Ok(())
}
