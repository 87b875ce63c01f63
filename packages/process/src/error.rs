//! Error types for process operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error;

/// Errors that can occur while inspecting or terminating processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process table could not be read at all.
    #[error("Failed to read the process table: {0}")]
    TableUnavailable(#[source] std::io::Error),

    /// The process exited before it could be terminated.
    #[error("Process {pid} does not exist")]
    NoSuchProcess {
        /// Process ID.
        pid: u32,
    },

    /// Not allowed to terminate the process.
    #[error("No permission to terminate process {pid}")]
    AccessDenied {
        /// Process ID.
        pid: u32,
    },

    /// Termination failed for another reason.
    #[error("Failed to terminate process {pid}: {message}")]
    TerminateFailed {
        /// Process ID.
        pid: u32,
        /// Error message.
        message: String,
    },
}
