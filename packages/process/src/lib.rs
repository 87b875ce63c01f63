//! Process lock resolution for spaceshift.
//!
//! When a file cannot be copied or deleted because another process holds it
//! open, this crate finds the holders, terminates them on request, and waits
//! for the OS to release the handles.
//!
//! The process table is reached through the [`ProcessTable`] capability so
//! the resolver can be driven by a fake in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use spaceshift_process::{LockResolver, SystemProcessTable};
//!
//! let resolver = LockResolver::new(SystemProcessTable::new(), config.retry_policy(), config.kill_scope);
//! let outcome = resolver.resolve_and_wait(&failed_paths, |report| {
//!     println!("{} processes hold these files", report.process_ids().len());
//!     true
//! });
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod error;
mod resolver;
mod system;
mod table;

pub use error::ProcessError;
pub use resolver::{LockResolver, LockedFile, LockedFileReport, ResolveOutcome};
pub use system::SystemProcessTable;
pub use table::{OpenHandles, ProcessHandle, ProcessTable};
