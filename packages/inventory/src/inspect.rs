//! Size and link inspection.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

/// Sum the sizes of all regular files under a path.
///
/// - If path is a file: returns its length
/// - If path is a directory: returns the total of every regular file below it
/// - If path doesn't exist or cannot be read: returns 0
///
/// Entries that cannot be inspected are logged and skipped. Links inside the
/// tree are not followed.
#[must_use]
pub fn calculate_size(path: &Path) -> u64 {
    let Ok(meta) = fs::metadata(path) else {
        log::debug!("Cannot inspect {}, treating size as 0", path.display());
        return 0;
    };

    if meta.is_file() {
        return meta.len();
    }

    if !meta.is_dir() {
        return 0;
    }

    let mut total: u64 = 0;

    for entry in jwalk::WalkDir::new(path)
        .skip_hidden(false)
        .follow_links(false)
        .sort(false)
        .parallelism(jwalk::Parallelism::Serial)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error walking {}: {e}", path.display());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => total = total.saturating_add(meta.len()),
            Err(e) => log::warn!("Error getting size for {}: {e}", entry.path().display()),
        }
    }

    total
}

/// Check whether a path is a directory link.
///
/// Returns `true` only for a path that resolves to a directory and carries
/// the OS link attribute: the reparse-point attribute on Windows, a symlink
/// elsewhere. Any inspection error yields `false`.
#[must_use]
pub fn is_link(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }

    match fs::symlink_metadata(path) {
        Ok(meta) => has_link_attribute(&meta),
        Err(e) => {
            log::debug!("Cannot inspect {}: {e}", path.display());
            false
        }
    }
}

#[cfg(windows)]
fn has_link_attribute(meta: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0400;
    meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
}

#[cfg(not(windows))]
fn has_link_attribute(meta: &fs::Metadata) -> bool {
    meta.file_type().is_symlink()
}
