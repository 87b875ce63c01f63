//! Confirmation hooks fulfilled by the caller.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use spaceshift_process::LockedFileReport;

/// Decisions the engine never makes on its own.
///
/// The CLI answers these with prompts; tests answer them with fixed values.
pub trait TransferHooks {
    /// Approve deleting an existing destination folder before copying.
    fn confirm_overwrite(&self, path: &Path) -> bool;

    /// Approve terminating the processes listed in `report`.
    fn confirm_kill(&self, report: &LockedFileReport) -> bool;

    /// Block until someone confirms `path` was deleted by hand.
    ///
    /// Called when `path` survives deletion with no files left in it.
    /// `remaining` lists the entries still present. Interactive callers keep
    /// waiting until the removal is confirmed; `false` means nobody can
    /// confirm it and gives up on the deletion.
    fn await_manual_delete(&self, path: &Path, remaining: &[PathBuf]) -> bool;
}
