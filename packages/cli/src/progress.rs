//! Progress bar utilities for the CLI.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress bar manager for scans and copies.
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    enabled: bool,
}

impl ProgressManager {
    /// Create a new progress manager.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            enabled,
        }
    }

    /// Create a progress bar for a folder copy.
    ///
    /// The length is unknown until the copy has counted its files; set it
    /// from the first progress report. If progress is disabled, returns a
    /// hidden progress bar.
    #[must_use]
    pub fn create_copy_bar(&self, label: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {prefix:<30} [{bar:25.green/dim}] {pos}/{len} files {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("━━─"),
        );
        pb.set_prefix(label.to_string());
        pb
    }

    /// Create a progress bar for measuring folder sizes.
    ///
    /// Shows the folder being measured. If progress is disabled, returns a
    /// hidden progress bar.
    #[must_use]
    pub fn create_scanning_bar(&self, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(" Scanning [{bar:20.green/dim}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("━━─"),
        );
        pb
    }

    /// Run `f` with every bar hidden, so prompts are not drawn over.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }

    /// Clear any active progress bars (for clean output after completion).
    pub fn clear(&self) {
        self.multi.clear().ok();
    }
}
