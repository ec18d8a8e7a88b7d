//! Parallel processing configuration
//!
//! Turns a process budget from [`crate::resources`] into a Rayon thread pool for
//! plane decoding. Pools are built locally rather than installed globally so a
//! library caller keeps control of its own global pool.

use crate::errors::{BrainIoError, Result};
use crate::resources::{compute_process_budget, CoreCountSource};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub const fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses a specific number of threads
    #[must_use]
    pub const fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Create a configuration from a process budget.
    ///
    /// Budgets below one still get a single worker; the budget itself is
    /// reported unchanged by the planner.
    #[must_use]
    pub fn from_budget(budget: i64) -> Self {
        if budget < 1 {
            warn!("Process budget {budget} leaves no workers, falling back to 1");
        }
        let threads = usize::try_from(budget.max(1)).unwrap_or(1);
        Self::with_threads(threads)
    }

    /// Compute a budget against `source` and convert it.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` cannot report a core count.
    pub fn from_source(
        source: &dyn CoreCountSource,
        min_free_cores: i64,
        max_processes: Option<i64>,
    ) -> Result<Self> {
        let budget = compute_process_budget(source, min_free_cores, max_processes)?;
        Ok(Self::from_budget(budget))
    }

    /// Build a thread pool with this configuration
    ///
    /// # Errors
    ///
    /// Returns [`BrainIoError::ThreadPoolError`] if Rayon cannot start the pool.
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("brainio-{i}"));
        if let Some(num_threads) = self.num_threads {
            builder = builder.num_threads(num_threads);
        }

        let pool = builder.build().map_err(|e| {
            BrainIoError::ThreadPoolError(format!(
                "Failed to initialize thread pool with {:?} threads: {e}",
                self.num_threads
            ))
        })?;
        debug!(threads = pool.current_num_threads(), "Built decode pool");
        Ok(pool)
    }
}
