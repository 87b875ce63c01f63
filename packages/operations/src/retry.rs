//! Retrying files that failed during the first copy pass.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use spaceshift_config::RetryPolicy;
use spaceshift_copy::{CopyError, FailedEntry, copy_file, mirror_path};
use spaceshift_process::{LockResolver, ProcessTable};

use crate::hooks::TransferHooks;

/// Result of retrying a set of failed files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Source paths that were copied on retry.
    pub recovered: Vec<PathBuf>,
    /// Files that still could not be copied.
    pub still_failed: Vec<FailedEntry>,
}

impl RetryOutcome {
    /// Number of files recovered by the retry pass.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.recovered.len()
    }
}

/// Retry every file in `failed` after clearing the processes that hold them.
///
/// Lock holders are resolved once for the whole set. Each file is then
/// copied again with up to `max_retries` attempts.
pub fn retry_failed_files<T, H>(
    resolver: &LockResolver<T>,
    hooks: &H,
    failed: &[FailedEntry],
    source_root: &Path,
    target_root: &Path,
) -> RetryOutcome
where
    T: ProcessTable,
    H: TransferHooks + ?Sized,
{
    let mut outcome = RetryOutcome::default();
    if failed.is_empty() {
        return outcome;
    }

    log::info!("Retrying {} failed files", failed.len());

    let paths: Vec<PathBuf> = failed.iter().map(|entry| entry.path.clone()).collect();
    resolver.resolve_and_wait(&paths, |report| hooks.confirm_kill(report));

    for entry in failed {
        if std::fs::symlink_metadata(&entry.path).is_err() {
            log::warn!("Skipping {}, source no longer exists", entry.path.display());
            outcome
                .still_failed
                .push(FailedEntry::new(&entry.path, "source no longer exists"));
            continue;
        }

        let Some(target) = mirror_path(source_root, target_root, &entry.path) else {
            outcome.still_failed.push(entry.clone());
            continue;
        };

        match retry_copy_file(&entry.path, &target, resolver.policy()) {
            Ok(()) => outcome.recovered.push(entry.path.clone()),
            Err(e) => outcome
                .still_failed
                .push(FailedEntry::new(&entry.path, e.to_string())),
        }
    }

    log::info!(
        "Recovered {} of {} failed files",
        outcome.success_count(),
        failed.len()
    );

    outcome
}

/// Copy one file, retrying per `policy`.
///
/// The policy delay is slept between attempts, never after the last one.
///
/// # Errors
///
/// * The error of the final attempt if every attempt fails
pub fn retry_copy_file(source: &Path, target: &Path, policy: RetryPolicy) -> Result<(), CopyError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match copy_file(source, target) {
            Ok(()) => {
                log::debug!("Copied {} on attempt {attempt}", source.display());
                return Ok(());
            }
            Err(e) if attempt < policy.max_retries => {
                log::warn!(
                    "Attempt {attempt}/{} for {} failed: {e}",
                    policy.max_retries,
                    source.display()
                );
                policy.pause();
            }
            Err(e) => {
                log::warn!("Giving up on {}: {e}", source.display());
                return Err(e);
            }
        }
    }
}
