//! Process table capability.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::error::ProcessError;

/// A running process, as seen in one snapshot of the process table.
///
/// The ID is only meaningful while that snapshot is current.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessHandle {
    /// Process ID.
    pub pid: u32,
    /// Executable name.
    pub name: String,
}

impl ProcessHandle {
    /// Create a new process handle.
    #[must_use]
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

/// Open file handles keyed by the path they refer to.
pub type OpenHandles = HashMap<PathBuf, BTreeSet<ProcessHandle>>;

/// Read and write access to the OS process table.
pub trait ProcessTable {
    /// Snapshot the open file handles on `paths`.
    ///
    /// The result may also hold handles on other paths; callers look up the
    /// ones they asked for. Processes that vanish or deny inspection are left
    /// out.
    ///
    /// # Errors
    ///
    /// * If the process table itself cannot be read
    fn list_open_handles(&self, paths: &[PathBuf]) -> Result<OpenHandles, ProcessError>;

    /// Parent process ID, if known.
    fn parent_of(&self, pid: u32) -> Option<u32>;

    /// Ask a process to terminate.
    ///
    /// # Errors
    ///
    /// * If the process does not exist or cannot be signalled
    fn terminate(&self, pid: u32) -> Result<(), ProcessError>;
}

impl<T: ProcessTable + ?Sized> ProcessTable for &T {
    fn list_open_handles(&self, paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
        (**self).list_open_handles(paths)
    }

    fn parent_of(&self, pid: u32) -> Option<u32> {
        (**self).parent_of(pid)
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        (**self).terminate(pid)
    }
}
