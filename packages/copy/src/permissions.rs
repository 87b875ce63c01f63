//! Permission pre-pass over a source tree.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

/// Grant full read/write/execute access on every entry under `path`.
///
/// If `path` is a file, its parent directory is processed instead. Links are
/// not followed and their targets are left untouched. Entries whose
/// permissions cannot be changed are logged and skipped.
///
/// This mutates the tree permanently: on Unix every entry becomes `0o777`,
/// on Windows the read-only attribute is cleared.
///
/// Returns the number of entries updated.
pub fn grant_full_permissions(path: &Path) -> u64 {
    let scope = if path.is_file() { path.parent() } else { Some(path) };

    let Some(scope) = scope else {
        return 0;
    };

    if !scope.exists() {
        log::debug!("Nothing to grant, {} does not exist", scope.display());
        return 0;
    }

    log::debug!("Granting full permissions under {}", scope.display());
    grant_recursive(scope)
}

fn grant_recursive(path: &Path) -> u64 {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            log::warn!("Error reading permissions of {}: {e}", path.display());
            return 0;
        }
    };

    if meta.file_type().is_symlink() {
        return 0;
    }

    let mut updated = 0;
    match fs::set_permissions(path, full_access(&meta)) {
        Ok(()) => updated += 1,
        Err(e) => log::warn!("Error changing permissions of {}: {e}", path.display()),
    }

    if !meta.is_dir() {
        return updated;
    }

    let read_dir = match fs::read_dir(path) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            log::warn!("Error listing {}: {e}", path.display());
            return updated;
        }
    };

    for entry in read_dir.flatten() {
        updated += grant_recursive(&entry.path());
    }

    updated
}

#[cfg(unix)]
fn full_access(_meta: &fs::Metadata) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    fs::Permissions::from_mode(0o777)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn full_access(meta: &fs::Metadata) -> fs::Permissions {
    let mut permissions = meta.permissions();
    permissions.set_readonly(false);
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_grant_counts_every_entry() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/file.txt"), "x").unwrap();
        fs::write(dir.path().join("a/b/other.txt"), "y").unwrap();

        // root, a, a/b, two files
        assert_eq!(grant_full_permissions(dir.path()), 5);
    }

    #[test]
    fn test_grant_on_file_uses_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        fs::write(dir.path().join("sibling.txt"), "y").unwrap();

        assert_eq!(grant_full_permissions(&file), 3);
    }

    #[test]
    fn test_grant_missing_path() {
        let dir = TempDir::new().unwrap();
        assert_eq!(grant_full_permissions(&dir.path().join("missing")), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_grant_clears_read_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("locked.txt");
        fs::write(&file, "x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o400)).unwrap();

        grant_full_permissions(dir.path());

        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o777);
    }

    #[cfg(unix)]
    #[test]
    fn test_grant_does_not_follow_links() {
        use std::os::unix::fs::PermissionsExt;

        let outside = TempDir::new().unwrap();
        let target = outside.path().join("target.txt");
        fs::write(&target, "x").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();

        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

        grant_full_permissions(dir.path());

        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
