//! Error types for copying a single entry.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error;

/// Why one file, link or directory could not be copied.
///
/// A tree copy never fails as a whole. These are rendered into the reasons
/// of the failure lists in [`crate::CopyResult`].
#[derive(Debug, Error)]
pub enum CopyError {
    /// A destination directory could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Destination directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// File contents could not be copied.
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFile {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An existing destination entry is in the way and could not be removed.
    #[error("Failed to replace existing {}: {source}", path.display())]
    ReplaceExisting {
        /// Destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A link in the source could not be read.
    #[error("Failed to read link {}: {source}", path.display())]
    ReadLink {
        /// Source link.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A link could not be recreated at the destination.
    #[error("Failed to create link {}: {source}", path.display())]
    CreateLink {
        /// Destination link.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Permissions or timestamps could not be read or applied.
    #[error("Failed to copy metadata for {}: {source}", path.display())]
    Metadata {
        /// The file whose metadata failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The walk produced a path outside the source root.
    #[error("{} is not under the source root", path.display())]
    OutsideSource {
        /// The offending path.
        path: PathBuf,
    },
}
