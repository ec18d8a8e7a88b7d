//! Defines command-line interface options using `clap` for the brainio application.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for loading, converting and planning reads of brain imaging volumes
#[derive(Parser, Debug)]
#[command(
    name = "brainio",
    version,
    about = "Loading and saving of brain imaging data"
)]
pub struct Args {
    /// Enable verbose (debug) logging. RUST_LOG takes precedence when set.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the naturally ordered file paths for a directory or `.txt` manifest
    Paths {
        /// Directory of planes or manifest file
        input: String,

        /// Keep only directory entries ending with this suffix, e.g. `.tif`
        #[arg(short, long)]
        ext: Option<String>,
    },

    /// Print how many worker processes would be used
    Plan {
        #[command(flatten)]
        workers: WorkerArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a stack of planes fits in available memory
    CheckMem {
        /// Size of one plane in bytes
        #[arg(long)]
        plane_bytes: u64,

        /// Number of planes
        #[arg(long)]
        planes: u64,
    },

    /// Rescale a volume along z and save it
    ScaleZ {
        /// Plane directory, manifest, NIfTI or multi-page TIFF file
        input: PathBuf,

        /// Output NIfTI file (`.nii`/`.nii.gz`), TIFF file or plane directory
        output: PathBuf,

        /// Depth scale factor, e.g. 0.5 halves the number of planes
        #[arg(short, long)]
        factor: f64,

        #[command(flatten)]
        workers: WorkerArgs,
    },

    /// Convert a plane directory or manifest into a NIfTI volume
    ToNii {
        input: PathBuf,
        output: PathBuf,

        /// Keep only directory entries ending with this suffix
        #[arg(short, long)]
        ext: Option<String>,

        #[command(flatten)]
        workers: WorkerArgs,
    },

    /// Split a NIfTI volume into one plane file per depth index
    ToTiffs { input: PathBuf, output_dir: PathBuf },

    /// Write a NIfTI volume as a single multi-page TIFF
    ToTiff { input: PathBuf, output: PathBuf },

    /// Ask crates.io whether a newer release exists
    CheckVersion,
}

/// Worker sizing shared by commands that decode planes
#[derive(clap::Args, Debug, Clone)]
pub struct WorkerArgs {
    /// CPU cores to leave free
    #[arg(long, env = "BRAINIO_MIN_FREE_CORES", default_value_t = brainio::resources::DEFAULT_MIN_FREE_CORES, allow_negative_numbers = true)]
    pub min_free_cores: i64,

    /// Upper bound on worker processes
    #[arg(long, env = "BRAINIO_MAX_PROCESSES")]
    pub max_processes: Option<i64>,

    /// Decode planes on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Resample each plane's rows by this factor while loading
    #[arg(long, default_value_t = 1.0)]
    pub x_scale: f64,

    /// Resample each plane's columns by this factor while loading
    #[arg(long, default_value_t = 1.0)]
    pub y_scale: f64,
}
