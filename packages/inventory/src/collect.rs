//! Ranking of candidate directories by size.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InventoryError;
use crate::inspect::{calculate_size, is_link};

/// A directory considered for relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Total bytes of regular files under the directory at inspection time.
    pub size_bytes: u64,
    /// Whether the directory is already a directory link.
    pub is_link: bool,
}

impl DirectoryEntry {
    /// Final path component, for display and for naming the destination.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().to_string(),
            |n| n.to_string_lossy().to_string(),
        )
    }
}

/// Inspect every immediate subdirectory of `root`, largest first.
///
/// # Errors
///
/// * If `root` cannot be listed
/// * If `root` contains no subdirectories
pub fn collect(root: &Path) -> Result<Vec<DirectoryEntry>, InventoryError> {
    collect_with_progress(root, |_, _, _| {})
}

/// Like [`collect`], reporting `(current, total, path)` before each
/// subdirectory is measured.
///
/// Children are listed in name order, so directories of equal size keep
/// that order in the result.
///
/// # Errors
///
/// * If `root` cannot be listed
/// * If `root` contains no subdirectories
pub fn collect_with_progress<F>(
    root: &Path,
    mut on_progress: F,
) -> Result<Vec<DirectoryEntry>, InventoryError>
where
    F: FnMut(usize, usize, &Path),
{
    log::info!("Scanning folders in {}", root.display());

    let read_dir = fs::read_dir(root).map_err(|e| InventoryError::ReadDir {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut children: Vec<PathBuf> = Vec::new();
    for entry in read_dir {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_dir() {
                    children.push(path);
                }
            }
            Err(e) => log::warn!("Skipping unreadable entry in {}: {e}", root.display()),
        }
    }

    if children.is_empty() {
        return Err(InventoryError::EmptyInventory {
            root: root.to_path_buf(),
        });
    }

    children.sort();
    let total = children.len();

    let mut entries = Vec::with_capacity(total);
    for (index, path) in children.into_iter().enumerate() {
        on_progress(index + 1, total, &path);

        let size_bytes = calculate_size(&path);
        let is_link = is_link(&path);
        log::debug!("{}: {size_bytes} bytes, link={is_link}", path.display());

        entries.push(DirectoryEntry {
            path,
            size_bytes,
            is_link,
        });
    }

    rank(&mut entries);
    Ok(entries)
}

/// Sort entries by size, largest first. Equal sizes keep their order.
pub fn rank(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
}

/// The first `n` entries, without re-sorting.
#[must_use]
pub fn top_n(entries: &[DirectoryEntry], n: usize) -> &[DirectoryEntry] {
    &entries[..n.min(entries.len())]
}
