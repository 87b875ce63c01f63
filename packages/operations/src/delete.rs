//! Forced deletion of a directory tree.
//!
//! Deletion runs as an explicit state machine:
//!
//! ```text
//! Attempt(n) -> Inspect(n) -> ResolveLocks(n) | AwaitManual(n) -> Attempt(n + 1) ... -> Verify -> Done
//! ```
//!
//! Each attempt removes whatever it can and ignores the rest. Leftover files
//! are routed through the lock resolver; a tree with no files left but still
//! present is handed to the caller for manual removal.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use spaceshift_copy::grant_full_permissions;
use spaceshift_process::{LockResolver, ProcessTable};

use crate::hooks::TransferHooks;

/// A step of the force-delete protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    /// Best-effort removal, numbered from 1.
    Attempt(u32),
    /// The path survived an attempt; look at what is left.
    Inspect(u32),
    /// Files are left; terminate their holders.
    ResolveLocks(u32, Vec<PathBuf>),
    /// Only directories are left; ask for manual removal.
    AwaitManual(u32, Vec<PathBuf>),
    /// Final existence check.
    Verify,
    /// Finished; `true` if the path is gone.
    Done(bool),
}

/// Entries left under a path after a delete attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remaining {
    /// Files and links, deepest first.
    pub files: Vec<PathBuf>,
    /// Directories, and entries that could not be read, deepest first.
    pub directories: Vec<PathBuf>,
}

/// Delete `path` and everything under it, terminating lock holders as needed.
///
/// A missing path counts as deleted and returns immediately. Otherwise up to
/// `max_retries` attempts are made, pausing the policy delay after each one.
/// Failure is reported through the return value, never as an error.
///
/// # Arguments
///
/// * `path` - File, link, or directory to delete
/// * `resolver` - Finds and terminates processes holding leftover files
/// * `hooks` - Confirms process termination and manual removal
pub fn delete_recursive<T, H>(path: &Path, resolver: &LockResolver<T>, hooks: &H) -> bool
where
    T: ProcessTable,
    H: TransferHooks + ?Sized,
{
    delete_recursive_with(path, resolver, hooks, remove_best_effort)
}

/// [`delete_recursive`] with the removal step supplied by the caller.
///
/// `remove` is called once per attempt and must not fail; whatever it leaves
/// behind is inspected afterwards.
pub fn delete_recursive_with<T, H, R>(
    path: &Path,
    resolver: &LockResolver<T>,
    hooks: &H,
    mut remove: R,
) -> bool
where
    T: ProcessTable,
    H: TransferHooks + ?Sized,
    R: FnMut(&Path),
{
    if !path_exists(path) {
        log::debug!("{} does not exist, nothing to delete", path.display());
        return true;
    }

    let is_real_dir = fs::symlink_metadata(path).is_ok_and(|m| m.is_dir());
    if is_real_dir {
        let granted = grant_full_permissions(path);
        log::debug!("Granted permissions on {granted} entries under {}", path.display());
    }

    let policy = resolver.policy();
    let mut state = DeleteState::Attempt(1);

    loop {
        log::trace!("Delete {}: {state:?}", path.display());
        state = match state {
            DeleteState::Attempt(attempt) => {
                log::info!(
                    "Deleting {} (attempt {attempt}/{})",
                    path.display(),
                    policy.max_retries
                );
                remove(path);
                policy.pause();
                if path_exists(path) {
                    DeleteState::Inspect(attempt)
                } else {
                    DeleteState::Verify
                }
            }
            DeleteState::Inspect(attempt) => {
                let remaining = remaining_entries(path);
                if remaining.files.is_empty() {
                    DeleteState::AwaitManual(attempt, remaining.directories)
                } else {
                    DeleteState::ResolveLocks(attempt, remaining.files)
                }
            }
            DeleteState::ResolveLocks(attempt, files) => {
                log::warn!(
                    "{} files under {} could not be deleted",
                    files.len(),
                    path.display()
                );
                resolver.resolve_and_wait(&files, |report| hooks.confirm_kill(report));
                next_attempt(attempt, policy.max_retries)
            }
            DeleteState::AwaitManual(attempt, remaining) => {
                log::warn!(
                    "{} has no files left but could not be removed",
                    path.display()
                );
                if hooks.await_manual_delete(path, &remaining) {
                    next_attempt(attempt, policy.max_retries)
                } else {
                    log::info!("Gave up waiting for manual deletion of {}", path.display());
                    DeleteState::Verify
                }
            }
            DeleteState::Verify => {
                policy.pause();
                DeleteState::Done(!path_exists(path))
            }
            DeleteState::Done(deleted) => {
                if deleted {
                    log::info!("Deleted {}", path.display());
                } else {
                    log::warn!("Failed to delete {}", path.display());
                }
                return deleted;
            }
        };
    }
}

const fn next_attempt(attempt: u32, max_retries: u32) -> DeleteState {
    if attempt < max_retries {
        DeleteState::Attempt(attempt + 1)
    } else {
        DeleteState::Verify
    }
}

/// Whether anything, including a dangling link, exists at `path`.
fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Remove `path` bottom-up, skipping whatever cannot be removed.
///
/// Links are removed without following them.
pub(crate) fn remove_best_effort(path: &Path) {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return;
    };

    if !meta.is_dir() {
        if let Err(e) = remove_link_or_file(path) {
            log::debug!("Could not remove {}: {e}", path.display());
        }
        return;
    }

    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries.flatten() {
                remove_best_effort(&entry.path());
            }
        }
        Err(e) => log::debug!("Could not read {}: {e}", path.display()),
    }

    if let Err(e) = fs::remove_dir(path) {
        log::debug!("Could not remove {}: {e}", path.display());
    }
}

/// Remove a file or a link. Directory links on Windows need `remove_dir`.
fn remove_link_or_file(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) => {
            fs::remove_dir(path).map_err(|_| e)
        }
        Err(e) => Err(e),
    }
}

/// List what is left under `path`, deepest entries first.
///
/// Entries that cannot be read are listed as directories so they still reach
/// the caller.
#[must_use]
pub fn remaining_entries(path: &Path) -> Remaining {
    let mut remaining = Remaining::default();

    for entry in jwalk::WalkDir::new(path)
        .parallelism(jwalk::Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    remaining.directories.push(entry.path());
                } else {
                    remaining.files.push(entry.path());
                }
            }
            Err(e) => {
                log::debug!("Could not read remaining entry: {e}");
                if let Some(p) = e.path() {
                    remaining.directories.push(p.to_path_buf());
                }
            }
        }
    }

    remaining.files.reverse();
    remaining.directories.reverse();
    remaining
}
