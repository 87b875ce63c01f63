//! Moving one folder to another volume and linking it back.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use spaceshift_config::RelocateConfig;
use spaceshift_copy::{CopyProgress, CopyResult, copy_tree};
use spaceshift_inventory::is_link;
use spaceshift_process::{LockResolver, ProcessTable};

use crate::delete::delete_recursive;
use crate::error::TransferError;
use crate::hooks::TransferHooks;
use crate::link::{TransferEvent, TransferState, swap_link};
use crate::retry::{RetryOutcome, retry_failed_files};
use crate::space::{DiskSpace, check_disk_space};
use crate::target::{TransferTarget, mark_hidden};

/// Everything that happened during one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// The folder that was transferred.
    pub source: PathBuf,
    /// Where it was copied.
    pub target: TransferTarget,
    /// Result of the first copy pass.
    pub copy: CopyResult,
    /// Result of retrying the files that failed the first pass.
    pub retried: RetryOutcome,
    /// Where the transfer ended.
    pub state: TransferState,
}

impl TransferReport {
    /// Files present at the destination after the copy and retries.
    #[must_use]
    pub fn files_copied(&self) -> u64 {
        self.copy.files_copied + self.retried.success_count() as u64
    }

    /// Whether the original path now links to the destination.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.state == TransferState::Linked
    }
}

/// Runs transfers with a fixed configuration, process table, disk space query and
/// set of confirmation hooks.
pub struct Relocator<'a, T, D, H>
where
    T: ProcessTable,
    D: DiskSpace,
    H: TransferHooks + ?Sized,
{
    config: &'a RelocateConfig,
    resolver: LockResolver<T>,
    disk: D,
    hooks: &'a H,
}

impl<'a, T, D, H> Relocator<'a, T, D, H>
where
    T: ProcessTable,
    D: DiskSpace,
    H: TransferHooks + ?Sized,
{
    /// Create a relocator.
    #[must_use]
    pub const fn new(config: &'a RelocateConfig, table: T, disk: D, hooks: &'a H) -> Self {
        Self {
            config,
            resolver: LockResolver::new(table, config.retry_policy(), config.kill_scope),
            disk,
            hooks,
        }
    }

    /// The lock resolver used for retries and deletion.
    #[must_use]
    pub const fn resolver(&self) -> &LockResolver<T> {
        &self.resolver
    }

    /// Force-delete `path`, terminating lock holders as needed.
    ///
    /// Returns `true` if `path` no longer exists.
    pub fn delete(&self, path: &Path) -> bool {
        delete_recursive(path, &self.resolver, self.hooks)
    }

    /// Check free space and create the destination folders for `folder_name`.
    ///
    /// The containment and free-space checks run before anything is created.
    /// An existing destination folder is removed only if the user approves.
    ///
    /// # Arguments
    ///
    /// * `source` - Folder that will be transferred
    /// * `destination_root` - Volume or folder to transfer into
    /// * `folder_name` - Name of the folder being transferred
    /// * `required` - Bytes the transfer needs
    ///
    /// # Errors
    ///
    /// * [`TransferError::DestinationInsideSource`] if the destination folder
    ///   would land inside `source`
    /// * If free space cannot be determined or is insufficient
    /// * If the hidden or staging folder cannot be created
    /// * If the destination exists and the user declines to replace it
    /// * If the existing destination cannot be deleted
    pub fn prepare_target(
        &self,
        source: &Path,
        destination_root: &Path,
        folder_name: &str,
        required: u64,
    ) -> Result<TransferTarget, TransferError> {
        let target = TransferTarget::plan(self.config, destination_root, folder_name);
        ensure_outside(source, &target.final_folder_path)?;

        check_disk_space(&self.disk, destination_root, required)?;

        create_dir(&target.hidden_root)?;
        mark_hidden(&target.hidden_root);
        create_dir(&target.staging_root)?;

        if fs::symlink_metadata(&target.final_folder_path).is_ok() {
            log::info!(
                "Destination {} already exists",
                target.final_folder_path.display()
            );
            if !self.hooks.confirm_overwrite(&target.final_folder_path) {
                return Err(TransferError::Cancelled {
                    path: target.final_folder_path,
                });
            }
            if !self.delete(&target.final_folder_path) {
                return Err(TransferError::DestinationNotCleared {
                    path: target.final_folder_path,
                });
            }
        }

        Ok(target)
    }

    /// Copy `source` to `target`, then replace it with a link.
    ///
    /// Files that fail the first pass are retried after their lock holders
    /// are dealt with. The original is deleted and linked only when every
    /// file and directory reached the destination; otherwise the report's
    /// state says where the transfer stopped and the original is untouched.
    ///
    /// # Errors
    ///
    /// * [`TransferError::SourceMissing`] if `source` does not exist
    /// * [`TransferError::AlreadyLinked`] if `source` is already a link
    /// * [`TransferError::DestinationInsideSource`] if the copy would recurse
    /// * [`TransferError::LinkFailedAfterDelete`] if `source` was deleted but
    ///   could not be linked
    pub fn transfer<F>(
        &self,
        source: &Path,
        target: &TransferTarget,
        on_progress: F,
    ) -> Result<TransferReport, TransferError>
    where
        F: FnMut(&CopyProgress),
    {
        if fs::symlink_metadata(source).is_err() {
            return Err(TransferError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if is_link(source) {
            return Err(TransferError::AlreadyLinked {
                path: source.to_path_buf(),
            });
        }
        ensure_outside(source, &target.final_folder_path)?;

        log::info!(
            "Transferring {} -> {}",
            source.display(),
            target.final_folder_path.display()
        );

        let mut state = TransferState::Copying;
        let copy = copy_tree(source, &target.final_folder_path, on_progress);
        log::info!(
            "First pass copied {}/{} files, {} failed",
            copy.files_copied,
            copy.files_total,
            copy.failed_files.len()
        );

        let retried = retry_failed_files(
            &self.resolver,
            self.hooks,
            &copy.failed_files,
            source,
            &target.final_folder_path,
        );

        state = state.advance(TransferEvent::FilesVerified {
            failed: retried.still_failed.len(),
        });
        state = state.advance(TransferEvent::DirectoriesVerified {
            failed: copy.failed_directories.len(),
        });
        state = swap_link(
            state,
            source,
            &target.final_folder_path,
            &self.resolver,
            self.hooks,
        )?;

        Ok(TransferReport {
            source: source.to_path_buf(),
            target: target.clone(),
            copy,
            retried,
            state,
        })
    }
}

fn ensure_outside(source: &Path, destination: &Path) -> Result<(), TransferError> {
    if destination.starts_with(source) {
        return Err(TransferError::DestinationInsideSource {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), TransferError> {
    fs::create_dir_all(path).map_err(|e| TransferError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    use spaceshift_process::{LockedFileReport, OpenHandles, ProcessError};
    use tempfile::TempDir;

    use crate::link::FailureStage;

    struct EmptyTable;

    impl ProcessTable for EmptyTable {
        fn list_open_handles(&self, _paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
            Ok(OpenHandles::new())
        }

        fn parent_of(&self, _pid: u32) -> Option<u32> {
            None
        }

        fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
            Err(ProcessError::NoSuchProcess { pid })
        }
    }

    struct Plenty;

    impl DiskSpace for Plenty {
        fn free_bytes(&self, _path: &Path) -> io::Result<u64> {
            Ok(u64::MAX)
        }
    }

    struct Hooks {
        overwrite: bool,
        overwrite_prompts: Cell<usize>,
    }

    impl Hooks {
        const fn new(overwrite: bool) -> Self {
            Self {
                overwrite,
                overwrite_prompts: Cell::new(0),
            }
        }
    }

    impl TransferHooks for Hooks {
        fn confirm_overwrite(&self, _path: &Path) -> bool {
            self.overwrite_prompts.set(self.overwrite_prompts.get() + 1);
            self.overwrite
        }

        fn confirm_kill(&self, _report: &LockedFileReport) -> bool {
            false
        }

        fn await_manual_delete(&self, _path: &Path, _remaining: &[PathBuf]) -> bool {
            false
        }
    }

    fn config() -> RelocateConfig {
        RelocateConfig {
            max_retries: 2,
            retry_delay_secs: 0,
            ..RelocateConfig::default()
        }
    }

    #[test]
    fn test_prepare_target_creates_layout() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);

        let target = relocator
            .prepare_target(&dir.path().join("Slack"), dir.path(), "Slack", 10)
            .unwrap();

        assert!(target.staging_root.is_dir());
        assert!(!target.final_folder_path.exists());
        assert_eq!(hooks.overwrite_prompts.get(), 0);
    }

    #[test]
    fn test_prepare_target_declined_overwrite() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let existing = dir.path().join("AppData/Roaming/Slack");
        fs::create_dir_all(&existing).unwrap();

        let err = relocator
            .prepare_target(&dir.path().join("Slack"), dir.path(), "Slack", 10)
            .unwrap_err();

        assert!(matches!(err, TransferError::Cancelled { .. }));
        assert!(existing.is_dir());
    }

    #[test]
    fn test_prepare_target_approved_overwrite() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let hooks = Hooks::new(true);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let existing = dir.path().join("AppData/Roaming/Slack");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("stale.txt"), "old").unwrap();

        let target = relocator
            .prepare_target(&dir.path().join("Slack"), dir.path(), "Slack", 10)
            .unwrap();

        assert_eq!(hooks.overwrite_prompts.get(), 1);
        assert!(!target.final_folder_path.exists());
    }

    #[test]
    fn test_transfer_missing_source() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let target = TransferTarget::plan(&config, &dir.path().join("dest"), "gone");

        let err = relocator
            .transfer(&dir.path().join("gone"), &target, |_| {})
            .unwrap_err();
        assert!(matches!(err, TransferError::SourceMissing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_transfer_refuses_linked_source() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        let linked = dir.path().join("linked");
        fs::create_dir_all(&real).unwrap();
        std::os::unix::fs::symlink(&real, &linked).unwrap();

        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let target = TransferTarget::plan(&config, &dir.path().join("dest"), "linked");

        let err = relocator.transfer(&linked, &target, |_| {}).unwrap_err();
        assert!(matches!(err, TransferError::AlreadyLinked { .. }));
    }

    #[test]
    fn test_transfer_refuses_destination_inside_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();

        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let target = TransferTarget::plan(&config, &source, "src");

        let err = relocator.transfer(&source, &target, |_| {}).unwrap_err();
        assert!(matches!(err, TransferError::DestinationInsideSource { .. }));
    }

    #[test]
    fn test_prepare_target_inside_source_leaves_source_untouched() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("Data");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        let config = config();
        let hooks = Hooks::new(true);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);

        let err = relocator
            .prepare_target(&source, &source, "Data", 1)
            .unwrap_err();

        assert!(matches!(err, TransferError::DestinationInsideSource { .. }));
        let listing: Vec<_> = fs::read_dir(&source)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(listing, vec![std::ffi::OsString::from("a.txt")]);
        assert_eq!(hooks.overwrite_prompts.get(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_transfer_links_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("empty")).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        fs::create_dir_all(dir.path().join("dest")).unwrap();
        let target = relocator
            .prepare_target(&source, &dir.path().join("dest"), "src", 1)
            .unwrap();
        let report = relocator.transfer(&source, &target, |_| {}).unwrap();

        assert!(report.is_linked());
        assert_eq!(report.files_copied(), 1);
        assert!(target.final_folder_path.join("empty").is_dir());
        assert_eq!(fs::read_to_string(source.join("a.txt")).unwrap(), "a");
    }

    #[test]
    fn test_transfer_keeps_source_when_files_fail() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        let config = config();
        let hooks = Hooks::new(false);
        let relocator = Relocator::new(&config, EmptyTable, Plenty, &hooks);
        let target = TransferTarget::plan(&config, &dir.path().join("dest"), "src");
        fs::create_dir_all(target.final_folder_path.join("a.txt").join("blocker")).unwrap();

        let report = relocator.transfer(&source, &target, |_| {}).unwrap();

        assert_eq!(report.state, TransferState::Failed(FailureStage::Copy));
        assert_eq!(report.retried.still_failed.len(), 1);
        assert!(source.join("a.txt").is_file());
        assert!(!is_link(&source));
    }
}
