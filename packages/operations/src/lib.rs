//! Copy-then-link transfer operations for spaceshift.
//!
//! This crate moves a folder to another volume and leaves a directory link
//! in its place:
//!
//! * Free-space check and destination layout ([`Relocator::prepare_target`])
//! * Fault-isolated tree copy with a retry pass for locked files
//! * Forced deletion of the original, terminating lock holders on request
//! * Junction (Windows) or symlink (Unix) creation
//!
//! It also lists candidate destination volumes and empties scratch folders.
//!
//! # Example
//!
//! ```rust,ignore
//! use spaceshift_operations::{Relocator, SystemDiskSpace};
//! use spaceshift_process::SystemProcessTable;
//!
//! let relocator = Relocator::new(&config, SystemProcessTable::new(), SystemDiskSpace::new(), &prompts);
//! let target = relocator.prepare_target(&entry.path, &destination, "Slack", entry.size_bytes)?;
//! let report = relocator.transfer(&entry.path, &target, |progress| {
//!     println!("{:.1}%", progress.percentage());
//! })?;
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod delete;
mod error;
mod hooks;
mod link;
mod purge;
mod retry;
mod space;
mod target;
mod transfer;
mod volumes;

pub use delete::{DeleteState, Remaining, delete_recursive, delete_recursive_with, remaining_entries};
pub use error::TransferError;
pub use hooks::TransferHooks;
pub use link::{FailureStage, TransferEvent, TransferState, create_directory_link, swap_link};
pub use purge::{PurgeReport, purge_directory_contents};
pub use retry::{RetryOutcome, retry_copy_file, retry_failed_files};
pub use space::{DiskSpace, SystemDiskSpace, check_disk_space};
pub use spaceshift_copy::CopyProgress;
pub use target::{TransferTarget, mark_hidden};
pub use transfer::{Relocator, TransferReport};
pub use volumes::{Volume, list_destination_volumes, mounted_volumes, volume_containing};
