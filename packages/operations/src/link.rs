//! Replacing a copied folder with a directory link.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io;
use std::path::Path;

use spaceshift_process::{LockResolver, ProcessTable};

use crate::delete::delete_recursive;
use crate::error::TransferError;
use crate::hooks::TransferHooks;

/// Stage at which a transfer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Files were still missing at the destination after retries.
    Copy,
    /// Directories could not be created at the destination.
    Directories,
    /// The original folder could not be deleted.
    Delete,
    /// The link could not be created.
    Link,
}

/// Progress of a single transfer.
///
/// ```text
/// Copying -> AllFilesOk -> DirectoriesOk -> Deleted -> Linked
///    \            \              \             \
///     Failed(Copy) Failed(Dirs)   Failed(Delete) Failed(Link)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// The tree copy and retries are running.
    Copying,
    /// Every file is present at the destination.
    AllFilesOk,
    /// Every directory is present at the destination.
    DirectoriesOk,
    /// The original folder is gone.
    Deleted,
    /// The original path now links to the destination.
    Linked,
    /// The transfer stopped.
    Failed(FailureStage),
}

/// Something that happened during a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    /// Files were verified after retries; `failed` is the count still missing.
    FilesVerified {
        /// Files still missing.
        failed: usize,
    },
    /// Directories were verified; `failed` is the count not created.
    DirectoriesVerified {
        /// Directories not created.
        failed: usize,
    },
    /// Deletion of the original folder finished.
    SourceDeleted(bool),
    /// Link creation finished.
    LinkCreated(bool),
}

impl TransferState {
    /// Apply `event` to this state.
    ///
    /// Terminal states never change. An event that does not belong to the
    /// current state leaves it unchanged.
    #[must_use]
    pub fn advance(self, event: TransferEvent) -> Self {
        let next = match (self, event) {
            (Self::Copying, TransferEvent::FilesVerified { failed: 0 }) => Self::AllFilesOk,
            (Self::Copying, TransferEvent::FilesVerified { .. }) => {
                Self::Failed(FailureStage::Copy)
            }
            (Self::AllFilesOk, TransferEvent::DirectoriesVerified { failed: 0 }) => {
                Self::DirectoriesOk
            }
            (Self::AllFilesOk, TransferEvent::DirectoriesVerified { .. }) => {
                Self::Failed(FailureStage::Directories)
            }
            (Self::DirectoriesOk, TransferEvent::SourceDeleted(true)) => Self::Deleted,
            (Self::DirectoriesOk, TransferEvent::SourceDeleted(false)) => {
                Self::Failed(FailureStage::Delete)
            }
            (Self::Deleted, TransferEvent::LinkCreated(true)) => Self::Linked,
            (Self::Deleted, TransferEvent::LinkCreated(false)) => Self::Failed(FailureStage::Link),
            (state, event) => {
                if !state.is_terminal() {
                    log::warn!("Ignoring {event:?} in state {state:?}");
                }
                state
            }
        };
        log::debug!("Transfer state: {self:?} -> {next:?}");
        next
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Linked | Self::Failed(_))
    }
}

/// Create a directory link at `link` pointing to `target`.
///
/// Unix gets a symbolic link. Windows gets a junction through `mklink /J`,
/// which needs no special privileges.
///
/// # Errors
///
/// * If something already exists at `link`
/// * If the link cannot be created
pub fn create_directory_link(link: &Path, target: &Path) -> io::Result<()> {
    log::debug!(
        "Creating directory link: {} -> {}",
        link.display(),
        target.display()
    );

    if fs_entry_exists(link) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", link.display()),
        ));
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)?;
    }

    #[cfg(windows)]
    {
        let output = std::process::Command::new("cmd")
            .arg("/C")
            .arg("mklink")
            .arg("/J")
            .arg(link)
            .arg(target)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(io::Error::other(format!(
                "mklink failed: {}",
                if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                }
            )));
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "directory links are not supported on this platform",
        ));
    }

    if !spaceshift_inventory::is_link(link) {
        return Err(io::Error::other(format!(
            "{} was not created as a directory link",
            link.display()
        )));
    }

    log::debug!("Created directory link successfully");
    Ok(())
}

/// Delete `source` and replace it with a link to `destination`.
///
/// Only valid from [`TransferState::DirectoriesOk`]; any other state is
/// returned unchanged without touching the filesystem.
///
/// # Errors
///
/// * [`TransferError::LinkFailedAfterDelete`] if `source` was deleted but the
///   link could not be created
pub fn swap_link<T, H>(
    state: TransferState,
    source: &Path,
    destination: &Path,
    resolver: &LockResolver<T>,
    hooks: &H,
) -> Result<TransferState, TransferError>
where
    T: ProcessTable,
    H: TransferHooks + ?Sized,
{
    if state != TransferState::DirectoriesOk {
        log::debug!("Not linking {}, state is {state:?}", source.display());
        return Ok(state);
    }

    let deleted = delete_recursive(source, resolver, hooks);
    let state = state.advance(TransferEvent::SourceDeleted(deleted));
    if !deleted {
        return Ok(state);
    }

    match create_directory_link(source, destination) {
        Ok(()) => Ok(state.advance(TransferEvent::LinkCreated(true))),
        Err(e) => {
            log::error!(
                "Deleted {} but could not link it to {}: {e}",
                source.display(),
                destination.display()
            );
            Err(TransferError::LinkFailedAfterDelete {
                source_dir: source.to_path_buf(),
                destination: destination.to_path_buf(),
                error: e,
            })
        }
    }
}

fn fs_entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use spaceshift_config::{KillScope, RetryPolicy};
    use spaceshift_process::{LockedFileReport, OpenHandles, ProcessError};
    use tempfile::TempDir;

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

    struct Hooks;

    impl TransferHooks for Hooks {
        fn confirm_overwrite(&self, _path: &Path) -> bool {
            true
        }

        fn confirm_kill(&self, _report: &LockedFileReport) -> bool {
            true
        }

        fn await_manual_delete(&self, _path: &Path, _remaining: &[PathBuf]) -> bool {
            false
        }
    }

    fn resolver() -> LockResolver<EmptyTable> {
        LockResolver::new(
            EmptyTable,
            RetryPolicy::new(2, Duration::ZERO),
            KillScope::Owner,
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let state = TransferState::Copying
            .advance(TransferEvent::FilesVerified { failed: 0 })
            .advance(TransferEvent::DirectoriesVerified { failed: 0 })
            .advance(TransferEvent::SourceDeleted(true))
            .advance(TransferEvent::LinkCreated(true));
        assert_eq!(state, TransferState::Linked);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failed_files_block_link() {
        let state = TransferState::Copying
            .advance(TransferEvent::FilesVerified { failed: 1 })
            .advance(TransferEvent::DirectoriesVerified { failed: 0 })
            .advance(TransferEvent::SourceDeleted(true));
        assert_eq!(state, TransferState::Failed(FailureStage::Copy));
    }

    #[test]
    fn test_failed_directories_block_delete() {
        let state = TransferState::Copying
            .advance(TransferEvent::FilesVerified { failed: 0 })
            .advance(TransferEvent::DirectoriesVerified { failed: 2 });
        assert_eq!(state, TransferState::Failed(FailureStage::Directories));
    }

    #[test]
    fn test_out_of_order_event_ignored() {
        let state = TransferState::Copying.advance(TransferEvent::LinkCreated(true));
        assert_eq!(state, TransferState::Copying);
    }

    #[cfg(unix)]
    #[test]
    fn test_create_directory_link() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("file.txt"), "content").unwrap();

        create_directory_link(&link, &target).unwrap();

        assert!(spaceshift_inventory::is_link(&link));
        assert_eq!(fs::read_to_string(link.join("file.txt")).unwrap(), "content");
    }

    #[test]
    fn test_create_directory_link_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(&link).unwrap();

        let err = create_directory_link(&link, &target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[cfg(unix)]
    #[test]
    fn test_swap_link() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&destination).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();
        fs::write(destination.join("a.txt"), "a").unwrap();

        let state = swap_link(
            TransferState::DirectoriesOk,
            &source,
            &destination,
            &resolver(),
            &Hooks,
        )
        .unwrap();

        assert_eq!(state, TransferState::Linked);
        assert_eq!(fs::read_link(&source).unwrap(), destination);
    }

    #[test]
    fn test_swap_link_skips_failed_state() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(&source).unwrap();

        let failed = TransferState::Failed(FailureStage::Copy);
        let state = swap_link(failed, &source, dir.path(), &resolver(), &Hooks).unwrap();

        assert_eq!(state, failed);
        assert!(source.is_dir());
    }
}
