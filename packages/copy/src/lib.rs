//! Fault-isolating directory tree copying with progress tracking.
//!
//! This crate copies a directory tree to a new location with:
//!
//! * An explicit permission pre-pass over the source tree
//! * Per-file fault isolation: a failed file is recorded, the walk goes on
//! * Mirroring of every directory, including empty ones
//! * Copy-on-write support via `reflink-copy` (APFS, Btrfs, `ReFS`)
//! * Timestamp preservation via `filetime`
//! * Progress callbacks for UI integration
//!
//! # Example
//!
//! ```rust,ignore
//! use spaceshift_copy::{copy_tree, CopyProgress};
//!
//! let result = copy_tree(source, target, |progress: &CopyProgress| {
//!     println!("{}/{} files copied", progress.files_copied, progress.files_total);
//! });
//!
//! for failed in &result.failed_files {
//!     println!("{}: {}", failed.path.display(), failed.reason);
//! }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod copy;
mod count;
mod error;
mod permissions;
mod progress;

pub use copy::{CopyResult, FailedEntry, copy_file, copy_tree, mirror_path};
pub use count::count_files;
pub use error::CopyError;
pub use permissions::grant_full_permissions;
pub use progress::CopyProgress;
