//! Resource planning for image loading
//!
//! Two questions are answered before a stack is decoded: how many worker
//! processes to use ([`compute_process_budget`]), and whether the stack fits in
//! memory at all ([`check_memory_feasibility`]). Both take their inputs through
//! small traits so either branch can be exercised without touching the host.

pub mod cores;
pub mod memory;

pub use cores::{
    detect_core_source, detect_core_source_with, parse_slurm_cpus, CoreCountSource, FixedCores,
    HostCores, SlurmCores, SLURM_JOB_ID,
};
pub use memory::{check_memory_feasibility, FixedMemory, MemoryProbe, SystemMemory};

use crate::errors::Result;
use tracing::debug;

/// Cores left free when the caller does not say otherwise
pub const DEFAULT_MIN_FREE_CORES: i64 = 2;

/// Number of worker processes to use.
///
/// The result is `usable cores - min_free_cores`, clamped to `max_processes`
/// when given. It is not floored: asking to keep more cores free than exist
/// yields zero or a negative number, and callers must guard against that.
///
/// # Errors
///
/// Returns an error if `source` cannot report a core count.
pub fn compute_process_budget(
    source: &dyn CoreCountSource,
    min_free_cores: i64,
    max_processes: Option<i64>,
) -> Result<i64> {
    debug!("Determining the maximum number of CPU cores to use");

    let usable = i64::try_from(source.usable_cores()?).unwrap_or(i64::MAX);
    let mut n_processes = usable.saturating_sub(min_free_cores);

    if let Some(max) = max_processes {
        n_processes = n_processes.min(max);
    }

    debug!(
        source = source.name(),
        usable, min_free_cores, ?max_processes, "Setting number of processes to: {n_processes}"
    );
    Ok(n_processes)
}

/// [`compute_process_budget`] against the detected core source of this process.
///
/// # Errors
///
/// Returns an error if the cluster allocation cannot be read.
pub fn get_num_processes(min_free_cores: i64, max_processes: Option<i64>) -> Result<i64> {
    let source = detect_core_source();
    compute_process_budget(source.as_ref(), min_free_cores, max_processes)
}

/// [`check_memory_feasibility`] against live system memory.
///
/// # Errors
///
/// Returns [`crate::BrainIoError::InsufficientMemory`] if the stack would not fit.
pub fn check_mem(plane_byte_size: u64, plane_count: u64) -> Result<()> {
    check_memory_feasibility(&SystemMemory, plane_byte_size, plane_count)
}
