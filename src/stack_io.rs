//! Image-plane stack I/O
//!
//! A stacked-image volume is a set of 2-D image files, one per depth index.
//! Plane `z` of a volume indexed `[x, y, z]` is stored as an image with `x` rows
//! and `y` columns. Decoding and encoding of the files themselves is left to the
//! `image` crate; this module decides which files to read, checks the stack fits
//! in memory, and spreads decoding over a pool sized by the process budget.

use crate::errors::{BrainIoError, Result};
use crate::parallel::ParallelConfig;
use crate::paths::{resolve_paths, PathSpec};
use crate::resources::{
    check_memory_feasibility, detect_core_source, CoreCountSource, MemoryProbe, SystemMemory,
    DEFAULT_MIN_FREE_CORES,
};
use crate::scale::{scale_plane, scaled_len};
use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, ImageBuffer, ImageError, Luma};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension used when writing planes without an explicit one
pub const DEFAULT_EXTENSION: &str = "tif";

/// Options for loading a plane stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackLoadOptions {
    /// Keep only directory entries ending with this suffix
    pub extension: Option<String>,
    /// Decode planes on a thread pool rather than the calling thread
    pub parallel: bool,
    /// Cores to leave free when sizing the pool
    pub min_free_cores: i64,
    /// Upper bound on pool size
    pub max_processes: Option<i64>,
    /// Resampling factor applied to each plane's rows
    pub x_scale: f64,
    /// Resampling factor applied to each plane's columns
    pub y_scale: f64,
}

impl Default for StackLoadOptions {
    fn default() -> Self {
        Self {
            extension: None,
            parallel: true,
            min_free_cores: DEFAULT_MIN_FREE_CORES,
            max_processes: None,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

impl StackLoadOptions {
    /// Decode on the calling thread
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Filter directory entries by suffix
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Resample every plane by `x` along its rows and `y` along its columns
    #[must_use]
    pub fn with_scaling(mut self, x: f64, y: f64) -> Self {
        self.x_scale = x;
        self.y_scale = y;
        self
    }

    #[allow(clippy::float_cmp)]
    fn rescales(&self) -> bool {
        self.x_scale != 1.0 || self.y_scale != 1.0
    }
}

/// Load every plane in a directory.
///
/// # Errors
///
/// Fails if the directory cannot be listed, holds no planes, the stack would
/// not fit in memory, or a plane cannot be decoded.
pub fn load_from_folder(dir: impl AsRef<Path>, options: &StackLoadOptions) -> Result<Array3<u16>> {
    load_stack(&PathSpec::Directory(dir.as_ref().to_path_buf()), options)
}

/// Load the planes listed in a manifest file.
///
/// # Errors
///
/// See [`load_from_folder`].
pub fn load_img_sequence(
    manifest: impl AsRef<Path>,
    options: &StackLoadOptions,
) -> Result<Array3<u16>> {
    load_stack(&PathSpec::ManifestFile(manifest.as_ref().to_path_buf()), options)
}

/// Load planes from an explicit list of paths.
///
/// # Errors
///
/// See [`load_from_folder`].
pub fn load_planes(paths: &[String], options: &StackLoadOptions) -> Result<Array3<u16>> {
    load_stack(&PathSpec::ExplicitList(paths.to_vec()), options)
}

/// Load a stack against the detected core source and live system memory.
///
/// # Errors
///
/// See [`load_from_folder`].
pub fn load_stack(spec: &PathSpec, options: &StackLoadOptions) -> Result<Array3<u16>> {
    let cores = detect_core_source();
    load_stack_with(spec, options, cores.as_ref(), &SystemMemory)
}

/// Load a stack with injected resource sources.
///
/// The first plane is decoded on its own to size the memory check, using the
/// plane size after any x/y scaling; the check runs before the volume is
/// allocated or any further plane is read.
///
/// # Errors
///
/// See [`load_from_folder`].
pub fn load_stack_with(
    spec: &PathSpec,
    options: &StackLoadOptions,
    cores: &dyn CoreCountSource,
    memory: &dyn MemoryProbe,
) -> Result<Array3<u16>> {
    let paths = resolve_paths(spec, options.extension.as_deref())?;
    let (first_path, rest) = paths.split_first().ok_or_else(|| BrainIoError::EmptyStack {
        input: describe_spec(spec),
    })?;

    let first = read_plane(first_path)?;
    let raw_dim = first.dim();
    let (rows, cols) = (
        scaled_len(raw_dim.0, options.x_scale)?,
        scaled_len(raw_dim.1, options.y_scale)?,
    );
    check_memory_feasibility(
        memory,
        plane_byte_size(rows, cols),
        paths.len() as u64,
    )?;

    let first = rescale(first, options)?;
    let load = |path: &String| -> Result<Array2<u16>> {
        let plane = read_plane(path)?;
        if plane.dim() != raw_dim {
            return Err(BrainIoError::PlaneMismatch {
                path: path.clone(),
                expected: raw_dim,
                got: plane.dim(),
            });
        }
        rescale(plane, options)
    };

    let rest_planes = if options.parallel && !rest.is_empty() {
        let pool = ParallelConfig::from_source(cores, options.min_free_cores, options.max_processes)?
            .build_pool()?;
        debug!(threads = pool.current_num_threads(), "Loading planes in parallel");
        pool.install(|| rest.par_iter().map(load).collect::<Result<Vec<_>>>())?
    } else {
        rest.iter().map(load).collect::<Result<Vec<_>>>()?
    };

    let mut volume = Array3::<u16>::zeros((rows, cols, paths.len()));
    let planes = std::iter::once(&first).chain(rest_planes.iter());
    for (z, plane) in planes.enumerate() {
        volume.index_axis_mut(Axis(2), z).assign(plane);
    }

    info!(shape = ?volume.shape(), "Loaded image stack");
    Ok(volume)
}

fn rescale(plane: Array2<u16>, options: &StackLoadOptions) -> Result<Array2<u16>> {
    if options.rescales() {
        scale_plane(plane.view(), options.x_scale, options.y_scale)
    } else {
        Ok(plane)
    }
}

/// Decode a single plane as 16-bit greyscale, `rows x cols`.
///
/// 8-bit greyscale samples are widened without rescaling, so a stored `3`
/// loads as `3`. Colour and floating-point planes are rejected.
///
/// # Errors
///
/// Propagates the decoder's error, or [`BrainIoError::UnsupportedPixelType`].
pub fn read_plane(path: impl AsRef<Path>) -> Result<Array2<u16>> {
    let path = path.as_ref();
    let img = image::open(path)?;
    let (width, height) = (img.width(), img.height());
    let raw = match img {
        DynamicImage::ImageLuma16(buffer) => buffer.into_raw(),
        DynamicImage::ImageLuma8(buffer) => {
            buffer.into_raw().into_iter().map(u16::from).collect()
        }
        other => {
            return Err(BrainIoError::UnsupportedPixelType {
                path: path.display().to_string(),
                color: format!("{:?}", other.color()),
            })
        }
    };
    Ok(Array2::from_shape_vec(
        (height as usize, width as usize),
        raw,
    )?)
}

/// Encode a single plane as 16-bit greyscale; the format follows the extension.
///
/// # Errors
///
/// Propagates the encoder's error.
pub fn write_plane(plane: ArrayView2<u16>, path: impl AsRef<Path>) -> Result<()> {
    let (rows, cols) = plane.dim();
    let dimension_mismatch =
        || ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch));

    let width = u32::try_from(cols).map_err(|_| dimension_mismatch())?;
    let height = u32::try_from(rows).map_err(|_| dimension_mismatch())?;
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, plane.iter().copied().collect())
            .ok_or_else(dimension_mismatch)?;

    buffer.save(path.as_ref())?;
    Ok(())
}

/// Write each depth plane of `volume` as `<prefix>_<z>.<extension>`.
///
/// The index is zero-padded to the width of the plane count, and missing parent
/// directories are created. Returns the written paths in depth order.
///
/// # Errors
///
/// Fails if the directory cannot be created or a plane cannot be encoded.
pub fn to_tiffs(
    volume: &Array3<u16>,
    path_prefix: impl AsRef<Path>,
    extension: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let prefix = path_prefix.as_ref();
    if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let extension = extension.unwrap_or(DEFAULT_EXTENSION).trim_start_matches('.');
    let depth = volume.len_of(Axis(2));
    let width = depth.to_string().len();

    let paths: Vec<PathBuf> = (0..depth)
        .map(|z| {
            let mut name = prefix.as_os_str().to_owned();
            name.push(format!("_{z:0width$}.{extension}"));
            PathBuf::from(name)
        })
        .collect();

    paths
        .par_iter()
        .enumerate()
        .try_for_each(|(z, path)| write_plane(volume.index_axis(Axis(2), z), path))?;

    info!(planes = depth, prefix = %prefix.display(), "Saved image stack");
    Ok(paths)
}

/// Bytes needed to hold one 16-bit plane in memory
#[must_use]
pub const fn plane_byte_size(rows: usize, cols: usize) -> u64 {
    (rows as u64)
        .saturating_mul(cols as u64)
        .saturating_mul(std::mem::size_of::<u16>() as u64)
}

fn describe_spec(spec: &PathSpec) -> String {
    match spec {
        PathSpec::ExplicitList(paths) => format!("list of {} paths", paths.len()),
        PathSpec::ManifestFile(path) | PathSpec::Directory(path) => path.display().to_string(),
    }
}
