//! Centralized error handling for brainio
//!
//! A single error enum covers the two terminal conditions raised by this crate
//! (`UnrecognizedInputFormat`, `InsufficientMemory`) and wraps the errors of the
//! imaging, array and filesystem libraries it delegates to without translating them.

use thiserror::Error;

/// Main error type for brainio operations
#[derive(Debug, Error)]
pub enum BrainIoError {
    /// Input was neither a list of paths, a `.txt` manifest, nor an existing directory
    #[error(
        "Input file path '{input}' is not a recognised format. Please check it is a list of \
         file paths, a text file of these paths, or a directory containing image files."
    )]
    UnrecognizedInputFormat { input: String },

    /// Requested stack would not fit in currently available memory
    #[error(
        "Not enough memory on the system to complete loading operation. \
         Needed {requested} bytes, only {available} available."
    )]
    InsufficientMemory { requested: u64, available: u64 },

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image plane decode/encode errors
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Multi-page TIFF decode/encode errors
    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    /// Plane stored with a pixel layout other than 8/16-bit greyscale
    #[error("Unsupported pixel type {color} in '{path}': expected 8 or 16-bit greyscale")]
    UnsupportedPixelType { path: String, color: String },

    /// NIfTI volume decode/encode errors
    #[error("NIfTI error: {0}")]
    NiftiError(#[from] nifti::error::NiftiError),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Scale factor that cannot drive a resampling
    #[error("Invalid scale factor {factor}: must be finite and greater than zero")]
    InvalidScaleFactor { factor: f64 },

    /// Volume with no voxels along one or more axes, or a rescale that would produce one
    #[error("Cannot resample a volume of shape {shape:?}")]
    EmptyVolume { shape: Vec<usize> },

    /// A plane whose dimensions differ from the first plane of its stack
    #[error("Plane '{path}' is {got:?} but the stack expects {expected:?}")]
    PlaneMismatch {
        path: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// Path resolution produced nothing to load
    #[error("No image planes found for '{input}'")]
    EmptyStack { input: String },

    /// Cluster job signal present but the allocation could not be read
    #[error("Scheduler error: {0}")]
    SchedulerInfo(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Release index lookup failed
    #[error("Version check failed: {0}")]
    VersionCheck(String),
}

/// Result type alias for brainio operations
pub type Result<T> = std::result::Result<T, BrainIoError>;
