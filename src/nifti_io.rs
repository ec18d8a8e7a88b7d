//! Single-file 3-D volume I/O (NIfTI-1)
//!
//! `.nii` and `.nii.gz` are both handled; compression follows the file name.

use crate::errors::Result;
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::fs;
use std::path::Path;
use tracing::info;

/// File name suffixes recognised as NIfTI volumes
pub const NIFTI_SUFFIXES: [&str; 2] = [".nii", ".nii.gz"];

/// Whether `path` names a NIfTI volume by suffix
#[must_use]
pub fn is_nifti_path(path: &str) -> bool {
    NIFTI_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Load a NIfTI volume as `[x, y, z]`.
///
/// Trailing singleton axes (e.g. a one-frame time axis) are dropped.
///
/// # Errors
///
/// Propagates the reader's error, or an array error if the volume is not 3-D.
pub fn load_nii(path: impl AsRef<Path>) -> Result<Array3<u16>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let volume = drop_trailing_singletons(obj.into_volume().into_ndarray::<u16>()?);
    let volume = volume.into_dimensionality::<Ix3>()?;

    info!(shape = ?volume.shape(), path = %path.as_ref().display(), "Loaded NIfTI volume");
    Ok(volume)
}

/// Save a `[x, y, z]` volume as NIfTI, creating parent directories.
///
/// # Errors
///
/// Propagates the writer's error.
pub fn to_nii(volume: &Array3<u16>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    WriterOptions::new(path).write_nifti(volume)?;
    info!(shape = ?volume.shape(), path = %path.display(), "Saved NIfTI volume");
    Ok(())
}

fn drop_trailing_singletons(mut volume: ArrayD<u16>) -> ArrayD<u16> {
    while volume.ndim() > 3 && volume.shape().last() == Some(&1) {
        let last = volume.ndim() - 1;
        volume = volume.index_axis_move(Axis(last), 0);
    }
    volume
}
