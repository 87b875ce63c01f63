//! Error types for inventory operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Failed to list the root directory.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDir {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The root has no subdirectories to rank.
    #[error("No folders found in {}", root.display())]
    EmptyInventory {
        /// The scanned root.
        root: PathBuf,
    },
}
