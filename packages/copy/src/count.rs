//! Pre-walk count of the entries a tree copy will attempt.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

/// Count the non-directory entries under `path`.
///
/// Regular files and links both count, since the copy recreates links as
/// links. A file counts as one and a missing path as zero. A link at `path`
/// itself counts as zero because the tree copy does not descend into it.
///
/// Subdirectories that cannot be read contribute nothing, matching what the
/// copy walk will see.
#[must_use]
pub fn count_files(path: &Path) -> u64 {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return 0;
    };

    let file_type = meta.file_type();
    if file_type.is_symlink() {
        return 0;
    }
    if !file_type.is_dir() {
        return 1;
    }

    let mut count = 0;
    for entry in jwalk::WalkDir::new(path)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::Serial)
    {
        match entry {
            Ok(entry) if !entry.file_type().is_dir() => count += 1,
            Ok(_) => {}
            Err(e) => log::debug!("Not counting unreadable entry: {e}"),
        }
    }
    count
}
