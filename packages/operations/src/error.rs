//! Error types for transfer operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a transfer.
///
/// Per-file and per-directory failures are not errors; they are reported in
/// the transfer report. Everything here except
/// [`TransferError::LinkFailedAfterDelete`] happens before any data is copied.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The folder to transfer does not exist.
    #[error("Source folder does not exist: {}", path.display())]
    SourceMissing {
        /// Source path.
        path: PathBuf,
    },

    /// The folder has already been transferred and replaced by a link.
    #[error("{} is already a directory link", path.display())]
    AlreadyLinked {
        /// Source path.
        path: PathBuf,
    },

    /// The destination would end up inside the folder being transferred.
    #[error("Destination {} is inside {}", destination.display(), source_dir.display())]
    DestinationInsideSource {
        /// The folder being transferred.
        source_dir: PathBuf,
        /// Destination path.
        destination: PathBuf,
    },

    /// Free space on the destination volume could not be determined.
    #[error("Failed to query free space of {}: {source}", path.display())]
    SpaceQuery {
        /// Volume path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Not enough free space on the destination volume.
    #[error("Not enough free space on {}: {required} bytes required, {free} bytes free", path.display())]
    InsufficientSpace {
        /// Volume path.
        path: PathBuf,
        /// Bytes required.
        required: u64,
        /// Bytes available.
        free: u64,
    },

    /// Failed to create a folder on the destination volume.
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The user declined to replace an existing destination folder.
    #[error("Transfer cancelled, {} already exists", path.display())]
    Cancelled {
        /// The existing destination folder.
        path: PathBuf,
    },

    /// An existing destination folder could not be removed.
    #[error("Failed to remove existing destination {}", path.display())]
    DestinationNotCleared {
        /// The existing destination folder.
        path: PathBuf,
    },

    /// The original folder was deleted but the link could not be created.
    ///
    /// The data now exists only at `destination`.
    #[error(
        "Deleted {} but failed to link it to {}: {error}. The data now exists only at {}",
        source_dir.display(),
        destination.display(),
        destination.display()
    )]
    LinkFailedAfterDelete {
        /// The deleted folder.
        source_dir: PathBuf,
        /// Where the data lives now.
        destination: PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_destination_inside_source_has_no_error_source() {
        let err = TransferError::DestinationInsideSource {
            source_dir: PathBuf::from("/data/Slack"),
            destination: PathBuf::from("/data/Slack/AppData/Roaming/Slack"),
        };

        assert!(err.source().is_none());
        assert_eq!(
            err.to_string(),
            "Destination /data/Slack/AppData/Roaming/Slack is inside /data/Slack"
        );
    }

    #[test]
    fn test_link_failed_after_delete_keeps_io_source() {
        let err = TransferError::LinkFailedAfterDelete {
            source_dir: PathBuf::from("/data/Slack"),
            destination: PathBuf::from("/mnt/Slack"),
            error: std::io::Error::other("denied"),
        };

        assert_eq!(err.source().map(ToString::to_string), Some("denied".to_string()));
        assert!(err.to_string().contains("only at /mnt/Slack"));
    }
}
