//! Tree copying with per-entry fault isolation.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::count::count_files;
use crate::error::CopyError;
use crate::permissions::grant_full_permissions;
use crate::progress::CopyProgress;

/// An entry that could not be copied or created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    /// Source path of the entry.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

impl FailedEntry {
    /// Create a new failure record.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FailedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result of a tree copy.
///
/// `files_copied + failed_files.len() == files_total` for a tree that nobody
/// else modified during the copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyResult {
    /// Number of files found by the pre-walk count.
    pub files_total: u64,
    /// Number of files copied.
    pub files_copied: u64,
    /// Files that failed to copy, in walk order.
    pub failed_files: Vec<FailedEntry>,
    /// Directories that failed to be created, in walk order.
    pub failed_directories: Vec<FailedEntry>,
}

impl CopyResult {
    /// Whether every file and directory made it to the destination.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_files.is_empty() && self.failed_directories.is_empty()
    }
}

/// Map a path under `source_root` to the same relative path under `target_root`.
///
/// Returns `None` if `path` is not under `source_root`.
#[must_use]
pub fn mirror_path(source_root: &Path, target_root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(source_root)
        .ok()
        .map(|rel| target_root.join(rel))
}

/// Copy a single file, overwriting the target if it exists.
///
/// Parent directories are created as needed. Contents are reflinked when the
/// filesystem supports it and copied otherwise; permissions and access and
/// modification times are carried over. Symlinks are recreated as symlinks.
///
/// # Errors
///
/// * If the parent directory cannot be created
/// * If the contents cannot be copied
/// * If the metadata cannot be applied
pub fn copy_file(source: &Path, target: &Path) -> Result<(), CopyError> {
    log::trace!("Copying file: {} -> {}", source.display(), target.display());

    let meta = fs::symlink_metadata(source).map_err(|e| CopyError::Metadata {
        path: source.to_path_buf(),
        source: e,
    })?;

    // Ensure parent directory exists
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| CopyError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    if meta.file_type().is_symlink() {
        if target.symlink_metadata().is_ok() {
            fs::remove_file(target).map_err(|e| CopyError::ReplaceExisting {
                path: target.to_path_buf(),
                source: e,
            })?;
        }
        return copy_symlink(source, target);
    }

    copy_file_with_reflink(source, target)?;
    copy_metadata(&meta, target)
}

/// Copy a directory tree, recording failures instead of stopping on them.
///
/// Phases:
///
/// 1. Grant full permissions on the source tree (see [`grant_full_permissions`])
/// 2. Count the files to copy and report initial progress
/// 3. Copy every file to its mirrored path under `target`, reporting progress
///    after each one
/// 4. Create every directory under `target`, including empty ones
///
/// If `source` is a single file it is copied to `target`.
///
/// Walks are serial and sorted, so both failure lists come back in a stable
/// order.
pub fn copy_tree<F>(source: &Path, target: &Path, mut on_progress: F) -> CopyResult
where
    F: FnMut(&CopyProgress),
{
    log::info!(
        "Copying tree: {} -> {}",
        source.display(),
        target.display()
    );

    // Phase 1: permissions
    grant_full_permissions(source);

    // Phase 2: count
    let files_total = count_files(source);
    log::debug!("Found {files_total} files to copy");

    let mut result = CopyResult {
        files_total,
        ..CopyResult::default()
    };

    on_progress(&CopyProgress::new(files_total, 0, None));

    if source.is_file() {
        copy_one(source, target, &mut result, &mut on_progress);
        return result;
    }

    // Phase 3: files
    for entry in walk(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Recorded once, during the directory pass
                log::debug!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let source_path = entry.path();
        match mirror_path(source, target, &source_path) {
            Some(target_path) => {
                copy_one(&source_path, &target_path, &mut result, &mut on_progress);
            }
            None => {
                let err = CopyError::OutsideSource {
                    path: source_path.clone(),
                };
                result
                    .failed_files
                    .push(FailedEntry::new(source_path, err.to_string()));
            }
        }
    }

    // Phase 4: directories, including empty ones
    if let Err(e) = fs::create_dir_all(target) {
        let err = CopyError::CreateDir {
            path: target.to_path_buf(),
            source: e,
        };
        log::warn!("{err}");
        result
            .failed_directories
            .push(FailedEntry::new(source, err.to_string()));
    }

    for entry in walk(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| source.to_path_buf(), Path::to_path_buf);
                log::warn!("Failed to enumerate {}: {e}", path.display());
                result
                    .failed_directories
                    .push(FailedEntry::new(path, e.to_string()));
                continue;
            }
        };

        if entry.depth() == 0 || !entry.file_type().is_dir() {
            continue;
        }

        let source_dir = entry.path();
        let Some(target_dir) = mirror_path(source, target, &source_dir) else {
            let err = CopyError::OutsideSource {
                path: source_dir.clone(),
            };
            result
                .failed_directories
                .push(FailedEntry::new(source_dir, err.to_string()));
            continue;
        };

        if let Err(e) = fs::create_dir_all(&target_dir) {
            let err = CopyError::CreateDir {
                path: target_dir,
                source: e,
            };
            log::warn!("{err}");
            result
                .failed_directories
                .push(FailedEntry::new(source_dir, err.to_string()));
        }
    }

    log::info!(
        "Copied {}/{} files ({} failed files, {} failed directories)",
        result.files_copied,
        result.files_total,
        result.failed_files.len(),
        result.failed_directories.len()
    );

    result
}

/// Copy one file as part of a tree copy and record the outcome.
fn copy_one<F>(source: &Path, target: &Path, result: &mut CopyResult, on_progress: &mut F)
where
    F: FnMut(&CopyProgress),
{
    match copy_file(source, target) {
        Ok(()) => {
            result.files_copied += 1;
            on_progress(&CopyProgress::new(
                result.files_total,
                result.files_copied,
                Some(source.to_path_buf()),
            ));
        }
        Err(e) => {
            log::warn!("{e}");
            result
                .failed_files
                .push(FailedEntry::new(source, e.to_string()));
        }
    }
}

/// Serial, sorted walk that never follows links.
fn walk(root: &Path) -> jwalk::WalkDir {
    jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial)
}

/// Copy a single file, trying reflink first then falling back to regular copy.
fn copy_file_with_reflink(source: &Path, target: &Path) -> Result<(), CopyError> {
    // Reflink only creates new files; an existing target goes straight to copy
    if !target.exists() {
        match reflink_copy::reflink(source, target) {
            Ok(()) => {
                log::trace!("Reflinked {} -> {}", source.display(), target.display());
                return Ok(());
            }
            Err(e) => log::trace!("Reflink unavailable for {}: {e}", source.display()),
        }
    }

    fs::copy(source, target).map_err(|e| CopyError::CopyFile {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })?;
    log::trace!("Copied {} -> {}", source.display(), target.display());
    Ok(())
}

/// Carry permissions and access/modification times over to the copy.
fn copy_metadata(meta: &fs::Metadata, target: &Path) -> Result<(), CopyError> {
    fs::set_permissions(target, meta.permissions()).map_err(|e| CopyError::Metadata {
        path: target.to_path_buf(),
        source: e,
    })?;

    filetime::set_file_times(
        target,
        FileTime::from_last_access_time(meta),
        FileTime::from_last_modification_time(meta),
    )
    .map_err(|e| CopyError::Metadata {
        path: target.to_path_buf(),
        source: e,
    })
}

/// Copy a symlink, preserving it as a symlink.
fn copy_symlink(source: &Path, target: &Path) -> Result<(), CopyError> {
    let link_target = fs::read_link(source).map_err(|e| CopyError::ReadLink {
        path: source.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&link_target, target).map_err(|e| {
            CopyError::CreateLink {
                path: target.to_path_buf(),
                source: e,
            }
        })?;
    }

    #[cfg(windows)]
    {
        // Relative targets resolve against the link's own directory
        let resolved = source
            .parent()
            .map_or_else(|| link_target.clone(), |parent| parent.join(&link_target));
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(&link_target, target).map_err(|e| {
                CopyError::CreateLink {
                    path: target.to_path_buf(),
                    source: e,
                }
            })?;
        } else {
            std::os::windows::fs::symlink_file(&link_target, target).map_err(|e| {
                CopyError::CreateLink {
                    path: target.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    log::trace!(
        "Symlinked {} -> {} (target: {})",
        source.display(),
        target.display(),
        link_target.display()
    );

    Ok(())
}
