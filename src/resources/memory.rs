//! Pre-flight memory checks
//!
//! The check is advisory: memory is not reserved, and other processes can
//! consume it between the check and the caller's allocation.

use crate::errors::{BrainIoError, Result};
use sysinfo::System;
use tracing::debug;

/// Something that can report currently available memory
pub trait MemoryProbe {
    /// Available memory in bytes
    fn available_bytes(&self) -> u64;
}

/// Live system memory via `sysinfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available_bytes(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory()
    }
}

/// A fixed amount of memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> u64 {
        self.0
    }
}

/// Check that `plane_count` planes of `plane_byte_size` bytes fit in available memory.
///
/// A request that overflows `u64` is treated as unbounded and always fails.
///
/// # Errors
///
/// Returns [`BrainIoError::InsufficientMemory`] when the requested total is
/// greater than or equal to what `probe` reports.
pub fn check_memory_feasibility(
    probe: &dyn MemoryProbe,
    plane_byte_size: u64,
    plane_count: u64,
) -> Result<()> {
    let requested = plane_byte_size.saturating_mul(plane_count);
    let available = probe.available_bytes();
    debug!(requested, available, "Checking memory for image stack");

    if requested >= available {
        return Err(BrainIoError::InsufficientMemory {
            requested,
            available,
        });
    }
    Ok(())
}
