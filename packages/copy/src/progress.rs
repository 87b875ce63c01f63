//! Progress reports emitted during a tree copy.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

/// Snapshot of a running tree copy.
///
/// The first report has `files_copied == 0` and no current file; one more
/// follows each successful file copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyProgress {
    /// Files found by the pre-walk count.
    pub files_total: u64,
    /// Files copied so far.
    pub files_copied: u64,
    /// Source path of the file just copied.
    pub current_file: Option<PathBuf>,
}

impl CopyProgress {
    /// Create a progress report.
    #[must_use]
    pub const fn new(files_total: u64, files_copied: u64, current_file: Option<PathBuf>) -> Self {
        Self {
            files_total,
            files_copied,
            current_file,
        }
    }

    /// Share of files copied, from 0.0 to 100.0. An empty tree is complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        match self.files_total {
            0 => 100.0,
            total => self.files_copied.min(total) as f64 * 100.0 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert!((CopyProgress::new(8, 2, None).percentage() - 25.0).abs() < f64::EPSILON);
        assert!((CopyProgress::new(0, 0, None).percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_never_exceeds_total() {
        // Files created during the copy can push the count past the pre-walk total
        let progress = CopyProgress::new(2, 3, None);
        assert!((progress.percentage() - 100.0).abs() < f64::EPSILON);
    }
}
