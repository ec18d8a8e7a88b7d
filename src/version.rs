//! Opt-in check for a newer published release
//!
//! Nothing here runs unless a caller asks for it. The release index is reached
//! through [`VersionSource`], so the check can be pointed at a stub.

use crate::errors::{BrainIoError, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Name this crate is published under
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

/// Version of this build
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const CRATES_IO_API: &str = "https://crates.io/api/v1/crates";

/// A place to ask for the latest released version of a crate
pub trait VersionSource {
    /// Latest released version string of `name`
    ///
    /// # Errors
    ///
    /// Returns [`BrainIoError::VersionCheck`] if the index cannot be queried.
    fn latest_version(&self, name: &str) -> Result<String>;
}

/// The crates.io HTTP API
#[derive(Debug, Clone)]
pub struct CratesIoSource {
    agent: ureq::Agent,
}

impl CratesIoSource {
    #[must_use]
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent(&format!("{CRATE_NAME}/{CURRENT_VERSION}"))
            .build();
        Self { agent }
    }
}

impl Default for CratesIoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionSource for CratesIoSource {
    fn latest_version(&self, name: &str) -> Result<String> {
        let url = format!("{CRATES_IO_API}/{name}");
        let body = match self.agent.get(&url).set("Accept", "application/json").call() {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| BrainIoError::VersionCheck(format!("reading {url}: {e}")))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(BrainIoError::VersionCheck(format!("{url} returned HTTP {code}")))
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(BrainIoError::VersionCheck(format!("request failed: {err}")))
            }
        };

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| BrainIoError::VersionCheck(format!("invalid JSON from {url}: {e}")))?;
        json.pointer("/crate/max_stable_version")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BrainIoError::VersionCheck(format!("{url} has no crate.max_stable_version"))
            })
    }
}

/// A newer release than the running one exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub name: String,
    pub current: String,
    pub latest: String,
    pub checked_at: DateTime<Utc>,
}

impl fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "This version of {name} ({current}) is not the most recent version. \
             Please update to v{latest} by running: 'cargo install {name} --force'",
            name = self.name,
            current = self.current,
            latest = self.latest,
        )
    }
}

/// Ask `source` for the latest version of `name` and compare it with `current`.
///
/// Returns `Some` only when the published version is strictly newer.
///
/// # Errors
///
/// Propagates the source's error.
pub fn check_for_update(
    name: &str,
    current: &str,
    source: &dyn VersionSource,
) -> Result<Option<UpdateNotice>> {
    let latest = source.latest_version(name)?;
    debug!(name, current, %latest, "Compared against latest release");

    if compare_versions(current, &latest) == Ordering::Less {
        Ok(Some(UpdateNotice {
            name: name.to_string(),
            current: current.to_string(),
            latest,
            checked_at: Utc::now(),
        }))
    } else {
        Ok(None)
    }
}

/// Compare dotted numeric versions.
///
/// Missing components count as zero. A pre-release (`1.0.0-rc.1`) sorts before
/// its release; pre-release tags themselves are compared as plain strings.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_core, a_pre) = split_pre(a);
    let (b_core, b_pre) = split_pre(b);

    let a_parts = numeric_parts(a_core);
    let b_parts = numeric_parts(b_core);
    let len = a_parts.len().max(b_parts.len());

    for i in 0..len {
        let x = a_parts.get(i).copied().unwrap_or(0);
        let y = b_parts.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    match (a_pre, b_pre) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

fn split_pre(version: &str) -> (&str, Option<&str>) {
    let version = version.trim().trim_start_matches('v');
    let version = version.split('+').next().unwrap_or(version);
    match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    }
}

fn numeric_parts(core: &str) -> Vec<u64> {
    core.split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}
