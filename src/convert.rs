//! Format-agnostic loading and conversions between plane stacks, multi-page
//! TIFF files and NIfTI

use crate::errors::{BrainIoError, Result};
use crate::nifti_io::{is_nifti_path, load_nii, to_nii, NIFTI_SUFFIXES};
use crate::paths::{PathSpec, MANIFEST_SUFFIX};
use crate::stack_io::{load_stack, to_tiffs, StackLoadOptions};
use crate::tiff_io::{is_tiff_path, load_img_stack, to_tiff};
use ndarray::Array3;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Load a volume from a `.txt` manifest, a plane directory, a NIfTI file or a
/// multi-page TIFF file.
///
/// The manifest suffix is checked before the directory test, the same
/// precedence as [`PathSpec::infer`].
///
/// # Errors
///
/// Returns [`BrainIoError::UnrecognizedInputFormat`] for anything else, and
/// propagates the loader's errors.
pub fn load_any(path: impl AsRef<Path>, options: &StackLoadOptions) -> Result<Array3<u16>> {
    let path = path.as_ref();
    let input = path.to_string_lossy();

    if input.ends_with(MANIFEST_SUFFIX) {
        debug!(%input, "Loading plane manifest");
        load_stack(&PathSpec::ManifestFile(path.to_path_buf()), options)
    } else if path.is_dir() {
        debug!(%input, "Loading plane directory");
        load_stack(&PathSpec::Directory(path.to_path_buf()), options)
    } else if is_nifti_path(&input) {
        load_nii(path)
    } else if is_tiff_path(&input) {
        debug!(%input, "Loading multi-page TIFF");
        load_img_stack(path)
    } else {
        let err = BrainIoError::UnrecognizedInputFormat {
            input: input.into_owned(),
        };
        error!("{err}");
        Err(err)
    }
}

/// Save a volume as NIfTI or a multi-page TIFF when `path` has one of their
/// suffixes, otherwise as planes inside the directory `path`. Returns the files
/// written.
///
/// # Errors
///
/// Propagates the writer's errors.
pub fn save_any(volume: &Array3<u16>, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let output = path.to_string_lossy();
    if is_nifti_path(&output) {
        to_nii(volume, path)?;
        Ok(vec![path.to_path_buf()])
    } else if is_tiff_path(&output) {
        to_tiff(volume, path)?;
        Ok(vec![path.to_path_buf()])
    } else {
        let stem = path
            .file_name()
            .map_or_else(|| "plane".to_string(), |n| n.to_string_lossy().into_owned());
        to_tiffs(volume, path.join(stem), None)
    }
}

/// Convert a plane directory (or manifest) into a single NIfTI volume.
///
/// # Errors
///
/// Propagates loading and writing errors.
pub fn tiffs_to_nii(
    input: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: &StackLoadOptions,
) -> Result<()> {
    let volume = load_any(input, options)?;
    to_nii(&volume, dest)
}

/// Split a NIfTI volume into one plane file per depth index inside `dest_dir`.
///
/// Planes are named after the volume, e.g. `brain.nii.gz` becomes `brain_00.tif`, ...
///
/// # Errors
///
/// Propagates loading and writing errors.
pub fn nii_to_tiffs(nii_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let nii_path = nii_path.as_ref();
    let volume = load_nii(nii_path)?;
    to_tiffs(&volume, dest_dir.as_ref().join(volume_stem(nii_path)), None)
}

/// Write a NIfTI volume out as a single multi-page TIFF.
///
/// # Errors
///
/// Propagates loading and writing errors.
pub fn nii_to_tiff(nii_path: impl AsRef<Path>, tiff_path: impl AsRef<Path>) -> Result<()> {
    let volume = load_nii(nii_path)?;
    to_tiff(&volume, tiff_path)
}

fn volume_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // Longest suffix first so ".nii.gz" is not left as ".nii"
    let mut suffixes = NIFTI_SUFFIXES;
    suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
    suffixes
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name.as_str())
        .to_string()
}
