//! Candidate destination volumes.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use sysinfo::Disks;

/// Mount point prefixes reserved for the system on Unix.
const SYSTEM_PREFIXES: &[&str] = &["/boot", "/dev", "/proc", "/run", "/snap", "/sys"];

/// A mounted volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Where the volume is mounted (`D:\` on Windows).
    pub mount_point: PathBuf,
    /// Capacity in bytes.
    pub total_bytes: u64,
    /// Bytes available to this process.
    pub available_bytes: u64,
}

/// Every mounted volume the OS reports.
#[must_use]
pub fn mounted_volumes() -> Vec<Volume> {
    Disks::new_with_refreshed_list()
        .iter()
        .map(|disk| Volume {
            mount_point: disk.mount_point().to_path_buf(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        })
        .collect()
}

/// List volumes that can receive transferred folders.
///
/// The volume holding the operating system is left out, as are system mount
/// points on Unix.
#[must_use]
pub fn list_destination_volumes() -> Vec<Volume> {
    let volumes = destination_volumes(mounted_volumes(), &system_root());
    log::debug!("Found {} destination volumes", volumes.len());
    volumes
}

/// The root of the volume holding the operating system.
fn system_root() -> PathBuf {
    if cfg!(windows) {
        let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
        PathBuf::from(format!("{drive}\\"))
    } else {
        PathBuf::from("/")
    }
}

/// Filter and order mounted volumes for use as destinations.
///
/// Drops relative mount points, the system volume, system mount points and
/// duplicate mounts, then sorts by mount point.
fn destination_volumes(volumes: Vec<Volume>, system_root: &Path) -> Vec<Volume> {
    let mut kept: Vec<Volume> = Vec::with_capacity(volumes.len());

    for volume in volumes {
        let mount = &volume.mount_point;
        if !mount.is_absolute() || is_same_root(mount, system_root) {
            continue;
        }
        if SYSTEM_PREFIXES
            .iter()
            .any(|prefix| mount.starts_with(prefix))
        {
            log::trace!("Skipping system mount {}", mount.display());
            continue;
        }
        if kept.iter().any(|v| v.mount_point == *mount) {
            continue;
        }
        kept.push(volume);
    }

    kept.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
    kept
}

/// Whether two volume roots name the same volume, ignoring drive letter case.
fn is_same_root(a: &Path, b: &Path) -> bool {
    a.to_string_lossy()
        .eq_ignore_ascii_case(&b.to_string_lossy())
}

/// The volume whose mount point is the deepest ancestor of `path`.
#[must_use]
pub fn volume_containing<'a>(volumes: &'a [Volume], path: &Path) -> Option<&'a Volume> {
    volumes
        .iter()
        .filter(|volume| path.starts_with(&volume.mount_point))
        .max_by_key(|volume| volume.mount_point.components().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(mount: &str, available: u64) -> Volume {
        Volume {
            mount_point: PathBuf::from(mount),
            total_bytes: available * 2,
            available_bytes: available,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_destination_volumes_drops_system_mounts() {
        let volumes = destination_volumes(
            vec![
                volume("/", 10),
                volume("/mnt/data", 50),
                volume("/boot/efi", 1),
                volume("/media/user/My Disk", 30),
                volume("/mnt/data", 50),
                volume("relative", 5),
            ],
            Path::new("/"),
        );

        let mounts: Vec<&Path> = volumes.iter().map(|v| v.mount_point.as_path()).collect();
        assert_eq!(
            mounts,
            vec![Path::new("/media/user/My Disk"), Path::new("/mnt/data")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_volume_containing_picks_deepest_mount() {
        let volumes = vec![volume("/", 10), volume("/mnt/data", 50)];

        let found = volume_containing(&volumes, Path::new("/mnt/data/Slack")).unwrap();
        assert_eq!(found.available_bytes, 50);

        let found = volume_containing(&volumes, Path::new("/home/user")).unwrap();
        assert_eq!(found.available_bytes, 10);
    }

    #[test]
    fn test_volume_containing_none() {
        let volumes = vec![volume("/mnt/data", 50)];
        assert!(volume_containing(&volumes, Path::new("/srv")).is_none());
    }

    #[test]
    fn test_is_same_root_ignores_case() {
        assert!(is_same_root(Path::new("c:\\"), Path::new("C:\\")));
        assert!(!is_same_root(Path::new("D:\\"), Path::new("C:\\")));
    }
}
