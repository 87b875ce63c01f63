//! Destination layout for a transfer.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use spaceshift_config::RelocateConfig;

/// Where a transferred folder ends up.
///
/// `<destination_root>/<hidden>/<staging>/<folder name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    /// Root of the destination volume or folder chosen by the user.
    pub destination_root: PathBuf,
    /// Hidden folder directly under the destination root.
    pub hidden_root: PathBuf,
    /// Staging folder inside the hidden folder.
    pub staging_root: PathBuf,
    /// Final location of the transferred folder.
    pub final_folder_path: PathBuf,
}

impl TransferTarget {
    /// Lay out the destination paths for `folder_name` without touching disk.
    #[must_use]
    pub fn plan(config: &RelocateConfig, destination_root: &Path, folder_name: &str) -> Self {
        let hidden_root = destination_root.join(&config.hidden_folder_name);
        let staging_root = hidden_root.join(&config.staging_folder_name);
        let final_folder_path = staging_root.join(folder_name);

        Self {
            destination_root: destination_root.to_path_buf(),
            hidden_root,
            staging_root,
            final_folder_path,
        }
    }
}

/// Set the hidden attribute on `path`.
///
/// Only Windows has such an attribute; elsewhere this does nothing.
#[cfg(windows)]
pub fn mark_hidden(path: &Path) {
    use std::os::windows::ffi::OsStrExt;
    use std::os::windows::fs::MetadataExt;
    use windows_sys::Win32::Storage::FileSystem::{FILE_ATTRIBUTE_HIDDEN, SetFileAttributesW};

    let current = std::fs::metadata(path).map_or(0, |m| m.file_attributes());
    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    let ok = unsafe { SetFileAttributesW(wide.as_ptr(), current | FILE_ATTRIBUTE_HIDDEN) };
    if ok == 0 {
        log::warn!(
            "Failed to hide {}: {}",
            path.display(),
            std::io::Error::last_os_error()
        );
    }
}

/// Set the hidden attribute on `path`.
///
/// Only Windows has such an attribute; elsewhere this does nothing.
#[cfg(not(windows))]
pub fn mark_hidden(path: &Path) {
    log::trace!("No hidden attribute to set on {}", path.display());
}
