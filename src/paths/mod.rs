//! Path resolution for image-plane stacks
//!
//! A stack can be described three ways: an explicit list of file paths, a text
//! manifest with one path per line, or a directory holding the planes. Each is a
//! [`PathSpec`] variant; [`resolve_paths`] turns any of them into one naturally
//! ordered list of path strings.
//!
//! When only a string is available, [`PathSpec::infer`] picks the variant with a
//! fixed precedence: the `.txt` suffix is checked before the filesystem is asked
//! whether the string names a directory.

pub mod natural;

pub use natural::{natsorted, natural_cmp, natural_sort};

use crate::errors::{BrainIoError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Suffix that marks a string as a manifest file
pub const MANIFEST_SUFFIX: &str = ".txt";

/// Where the list of plane files comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    /// Paths already in memory; used as-is, no I/O
    ExplicitList(Vec<String>),
    /// Text file with one path per line
    ManifestFile(PathBuf),
    /// Directory whose direct children are the planes
    Directory(PathBuf),
}

impl PathSpec {
    /// Classify a single string input.
    ///
    /// # Errors
    ///
    /// Returns [`BrainIoError::UnrecognizedInputFormat`] when `input` neither ends
    /// in `.txt` nor names an existing directory.
    pub fn infer(input: &str) -> Result<Self> {
        if input.ends_with(MANIFEST_SUFFIX) {
            return Ok(Self::ManifestFile(PathBuf::from(input)));
        }
        if Path::new(input).is_dir() {
            return Ok(Self::Directory(PathBuf::from(input)));
        }

        let err = BrainIoError::UnrecognizedInputFormat {
            input: input.to_string(),
        };
        error!("{err}");
        Err(err)
    }

    /// Short label for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExplicitList(_) => "list",
            Self::ManifestFile(_) => "manifest",
            Self::Directory(_) => "directory",
        }
    }
}

impl From<Vec<String>> for PathSpec {
    fn from(paths: Vec<String>) -> Self {
        Self::ExplicitList(paths)
    }
}

impl From<&[&str]> for PathSpec {
    fn from(paths: &[&str]) -> Self {
        Self::ExplicitList(paths.iter().map(|p| (*p).to_string()).collect())
    }
}

/// Resolve a [`PathSpec`] into a naturally sorted list of paths.
///
/// `extension` only applies to the directory variant, where it keeps children
/// whose file name ends with the given suffix (e.g. `".tif"`).
///
/// # Errors
///
/// Propagates the I/O error of reading the manifest or listing the directory.
pub fn resolve_paths(spec: &PathSpec, extension: Option<&str>) -> Result<Vec<String>> {
    debug!(kind = spec.kind(), ?extension, "Resolving file paths");

    let paths = match spec {
        PathSpec::ExplicitList(paths) => paths.clone(),
        PathSpec::ManifestFile(manifest) => read_manifest(manifest)?,
        PathSpec::Directory(dir) => list_directory(dir, extension)?,
    };

    Ok(natsorted(paths))
}

/// Infer the input shape from a string and resolve it.
///
/// # Errors
///
/// See [`PathSpec::infer`] and [`resolve_paths`].
pub fn get_sorted_file_paths(input: &str, extension: Option<&str>) -> Result<Vec<String>> {
    resolve_paths(&PathSpec::infer(input)?, extension)
}

/// One path per line, edges trimmed. Blank lines carry no path and are skipped.
fn read_manifest(manifest: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(manifest)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Direct children of `dir`, joined onto it. Dot-files are not planes.
fn list_directory(dir: &Path, extension: Option<&str>) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }
        if let Some(ext) = extension {
            if !name.ends_with(ext) {
                continue;
            }
        }

        paths.push(dir.join(&file_name).to_string_lossy().into_owned());
    }

    Ok(paths)
}
