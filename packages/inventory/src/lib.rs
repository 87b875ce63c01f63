//! Directory inventory for spaceshift.
//!
//! This crate answers two questions about a folder:
//!
//! * How many bytes of regular files live under it
//! * Whether it is already a directory link (junction or symlink)
//!
//! and ranks the immediate subdirectories of a root by size so the largest
//! candidates for relocation come first.
//!
//! # Example
//!
//! ```rust,ignore
//! use spaceshift_inventory::{collect, top_n};
//!
//! let entries = collect(roaming_dir)?;
//! for entry in top_n(&entries, 10) {
//!     println!("{} {} bytes", entry.path.display(), entry.size_bytes);
//! }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod collect;
mod error;
mod inspect;

pub use collect::{DirectoryEntry, collect, collect_with_progress, rank, top_n};
pub use error::InventoryError;
pub use inspect::{calculate_size, is_link};
