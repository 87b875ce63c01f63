//! Emptying a scratch directory such as the temp folder.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

use spaceshift_inventory::calculate_size;

use crate::delete::remove_best_effort;

/// Sizes around a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Bytes under the directory before the purge.
    pub size_before: u64,
    /// Bytes under the directory after the purge.
    pub size_after: u64,
}

impl PurgeReport {
    /// Bytes reclaimed.
    #[must_use]
    pub const fn freed(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }
}

/// Delete everything inside `path`, keeping `path` itself.
///
/// Entries in use or otherwise protected are skipped silently. No processes
/// are terminated and nothing is retried.
#[must_use]
pub fn purge_directory_contents(path: &Path) -> PurgeReport {
    let size_before = calculate_size(path);
    log::info!("Purging {} ({size_before} bytes)", path.display());

    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries.flatten() {
                remove_best_effort(&entry.path());
            }
        }
        Err(e) => log::warn!("Could not read {}: {e}", path.display()),
    }

    let report = PurgeReport {
        size_before,
        size_after: calculate_size(path),
    };
    log::info!("Freed {} bytes in {}", report.freed(), path.display());
    report
}
