//! Free-space checks for the destination volume.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::io;
use std::path::Path;

use crate::error::TransferError;
use crate::volumes::{mounted_volumes, volume_containing};

/// Source of free-space figures for a volume.
pub trait DiskSpace {
    /// Bytes available to this process on the volume containing `path`.
    ///
    /// # Errors
    ///
    /// * If the volume cannot be queried
    fn free_bytes(&self, path: &Path) -> io::Result<u64>;
}

impl<D: DiskSpace + ?Sized> DiskSpace for &D {
    fn free_bytes(&self, path: &Path) -> io::Result<u64> {
        (**self).free_bytes(path)
    }
}

/// Free space as reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDiskSpace;

impl SystemDiskSpace {
    /// Create a new system disk space query.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DiskSpace for SystemDiskSpace {
    fn free_bytes(&self, path: &Path) -> io::Result<u64> {
        let resolved = fs::canonicalize(path)?;
        #[cfg(windows)]
        let resolved = strip_verbatim_prefix(&resolved);
        let volumes = mounted_volumes();

        volume_containing(&volumes, &resolved)
            .map(|volume| volume.available_bytes)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no mounted volume contains {}", resolved.display()),
                )
            })
    }
}

/// Turn `\\?\C:\dir` from `canonicalize` back into `C:\dir` so it
/// matches drive mount points.
#[cfg(windows)]
fn strip_verbatim_prefix(path: &Path) -> std::path::PathBuf {
    let text = path.to_string_lossy();
    match text.strip_prefix(r"\\?\") {
        Some(rest) if !rest.starts_with("UNC") => std::path::PathBuf::from(rest),
        _ => path.to_path_buf(),
    }
}

/// Check that the volume containing `volume` can hold `required` bytes.
///
/// Returns the free byte count when it suffices.
///
/// # Errors
///
/// * [`TransferError::SpaceQuery`] if the volume cannot be queried
/// * [`TransferError::InsufficientSpace`] if `required` exceeds the free space
pub fn check_disk_space<D: DiskSpace + ?Sized>(
    disk: &D,
    volume: &Path,
    required: u64,
) -> Result<u64, TransferError> {
    let free = disk
        .free_bytes(volume)
        .map_err(|e| TransferError::SpaceQuery {
            path: volume.to_path_buf(),
            source: e,
        })?;

    log::info!(
        "{}: {free} bytes free, {required} bytes required",
        volume.display()
    );

    if required > free {
        return Err(TransferError::InsufficientSpace {
            path: volume.to_path_buf(),
            required,
            free,
        });
    }

    Ok(free)
}
