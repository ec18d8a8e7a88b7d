//! Sources for the number of CPU cores a job may use
//!
//! Inside a SLURM allocation the host CPU count overstates what the job was
//! granted, so the scheduler's figure is used instead. Both sources sit behind
//! [`CoreCountSource`] so callers and tests can inject either one.

use crate::errors::{BrainIoError, Result};
use std::env;
use tracing::debug;

/// Environment variable whose presence marks a SLURM job
pub const SLURM_JOB_ID: &str = "SLURM_JOB_ID";

/// Allocation variables consulted, most specific first
const SLURM_CORE_VARS: [&str; 3] = [
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "SLURM_JOB_CPUS_PER_NODE",
];

/// Something that can report how many cores are usable
pub trait CoreCountSource {
    /// Label used in logs and CLI output
    fn name(&self) -> &'static str;

    /// Number of usable cores before any are reserved
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be read.
    fn usable_cores(&self) -> Result<usize>;
}

/// Logical CPUs of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCores;

impl CoreCountSource for HostCores {
    fn name(&self) -> &'static str {
        "host"
    }

    fn usable_cores(&self) -> Result<usize> {
        Ok(num_cpus::get())
    }
}

/// A fixed core count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCores(pub usize);

impl CoreCountSource for FixedCores {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn usable_cores(&self) -> Result<usize> {
        Ok(self.0)
    }
}

/// Cores allocated to the current SLURM job
///
/// Reads allocation variables through `lookup`, which defaults to the process
/// environment.
pub struct SlurmCores {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl SlurmCores {
    /// Read allocation details from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_lookup(|key| env::var(key).ok())
    }

    /// Read allocation details through a custom lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl std::fmt::Debug for SlurmCores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlurmCores").finish_non_exhaustive()
    }
}

impl CoreCountSource for SlurmCores {
    fn name(&self) -> &'static str {
        "slurm"
    }

    fn usable_cores(&self) -> Result<usize> {
        for var in SLURM_CORE_VARS {
            if let Some(value) = (self.lookup)(var) {
                let cores = parse_slurm_cpus(&value).ok_or_else(|| {
                    BrainIoError::SchedulerInfo(format!("cannot parse {var}={value:?}"))
                })?;
                debug!(var, cores, "Read SLURM core allocation");
                return Ok(cores);
            }
        }

        Err(BrainIoError::SchedulerInfo(format!(
            "{SLURM_JOB_ID} is set but none of {} are",
            SLURM_CORE_VARS.join(", ")
        )))
    }
}

/// Parse a SLURM CPU count, including the compressed per-node form.
///
/// `"8"` is 8; `"8(x2),4"` describes two nodes with 8 and one with 4, and the
/// first node's count (the one this process runs on under the usual launch) is used.
#[must_use]
pub fn parse_slurm_cpus(value: &str) -> Option<usize> {
    let first = value.trim().split(',').next()?;
    let count = first.split('(').next()?;
    count.trim().parse().ok()
}

/// Pick the core source for the current process
///
/// The SLURM source is used whenever [`SLURM_JOB_ID`] is set; its value is not inspected.
#[must_use]
pub fn detect_core_source() -> Box<dyn CoreCountSource> {
    detect_core_source_with(|key| env::var(key).ok())
}

/// Pick the core source, reading variables through `lookup`
///
/// The same lookup backs the SLURM source when it is chosen.
#[must_use]
pub fn detect_core_source_with<F>(lookup: F) -> Box<dyn CoreCountSource>
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    if lookup(SLURM_JOB_ID).is_some() {
        debug!("{SLURM_JOB_ID} set, using SLURM allocation");
        Box::new(SlurmCores::with_lookup(lookup))
    } else {
        Box::new(HostCores)
    }
}
