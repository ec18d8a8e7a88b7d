//! brainio: loading and saving of volumetric brain imaging data
//!
//! brainio reads and writes 3-D volumes stored either as a stack of 2-D image
//! planes (one file per depth index) or as a single NIfTI file. Around that it
//! provides the helpers that decide *what* to read, *in what order*, and *with how
//! many workers*.
//!
//! ## Key Features
//!
//! - **Natural path ordering**: `plane2` before `plane10`, from a list, a `.txt` manifest or a directory
//! - **Resource planning**: worker counts aware of SLURM allocations, pre-flight memory checks
//! - **Parallel decoding**: plane stacks decoded on a Rayon pool sized by the plan
//! - **Rescaling**: linear resampling along the depth axis, and per plane on load
//!
//! ## Module Organization
//!
//! - [`paths`]: Path specifications and natural sorting
//! - [`resources`]: Core-count sources, process budget, memory feasibility
//! - [`parallel`]: Thread pool configuration from a process budget
//! - [`scale`]: Depth-axis rescaling
//! - [`stack_io`]: Image-plane stack load/save
//! - [`nifti_io`]: NIfTI volume load/save
//! - [`tiff_io`]: Multi-page TIFF volume load/save
//! - [`convert`]: Format-agnostic loading and conversions
//! - [`version`]: Opt-in check for newer releases
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use brainio::prelude::*;
//!
//! // Directory of planes, naturally ordered
//! let paths = get_sorted_file_paths("/data/brain", Some(".tif")).unwrap();
//!
//! // How many workers, leaving two cores free
//! let n = brainio::resources::get_num_processes(2, None).unwrap();
//!
//! // Load, then halve the depth
//! let volume = load_from_folder("/data/brain", &StackLoadOptions::default()).unwrap();
//! let half = scale_z(&volume.mapv(f32::from), 0.5).unwrap();
//! ```

// Core modules
pub mod errors;
pub mod parallel;
pub mod paths;
pub mod resources;
pub mod scale;

// Volume I/O
pub mod convert;
pub mod nifti_io;
pub mod stack_io;
pub mod tiff_io;

pub mod version;

// Direct re-exports for the public API
pub use errors::*;
pub use paths::{get_sorted_file_paths, resolve_paths, PathSpec};
pub use resources::{check_mem, compute_process_budget, get_num_processes};
pub use scale::scale_z;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::convert::{load_any, nii_to_tiff, nii_to_tiffs, save_any, tiffs_to_nii};
    pub use crate::errors::{BrainIoError, Result};
    pub use crate::nifti_io::{load_nii, to_nii};
    pub use crate::parallel::ParallelConfig;
    pub use crate::paths::{get_sorted_file_paths, natural_cmp, resolve_paths, PathSpec};
    pub use crate::resources::{
        check_memory_feasibility, compute_process_budget, CoreCountSource, MemoryProbe,
    };
    pub use crate::scale::scale_z;
    pub use crate::stack_io::{
        load_from_folder, load_img_sequence, load_planes, to_tiffs, StackLoadOptions,
    };
    pub use crate::tiff_io::{load_img_stack, to_tiff};
}
