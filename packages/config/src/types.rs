//! Configuration types for spaceshift.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts for every retry site.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Default pause between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
/// Default number of ranked folders shown to the user.
pub const DEFAULT_DISPLAY_COUNT: usize = 10;
/// Default name of the hidden top-level folder on the destination volume.
pub const DEFAULT_HIDDEN_FOLDER_NAME: &str = "AppData";
/// Default name of the staging folder inside the hidden folder.
pub const DEFAULT_STAGING_FOLDER_NAME: &str = "Roaming";

/// Which process gets terminated when a file is held open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KillScope {
    /// Terminate the process that owns the handle.
    #[default]
    Owner,
    /// Terminate the top-level ancestor of the owning process.
    TreeRoot,
}

impl std::fmt::Display for KillScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::TreeRoot => write!(f, "tree-root"),
        }
    }
}

/// Bounded retry settings shared by every retry site.
///
/// File copy retries, directory deletion retries and the pause after
/// terminating processes all read the same pair of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Block the current thread for the configured delay.
    pub fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        )
    }
}

/// spaceshift configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelocateConfig {
    /// Maximum attempts for file copy and directory deletion retries.
    pub max_retries: u32,

    /// Seconds to wait between attempts and after terminating processes.
    pub retry_delay_secs: u64,

    /// Number of ranked folders offered for selection.
    pub display_count: usize,

    /// Hidden folder created at the root of the destination volume.
    pub hidden_folder_name: String,

    /// Folder inside the hidden folder that receives transferred data.
    pub staging_folder_name: String,

    /// Which process to terminate when a file is held open.
    pub kill_scope: KillScope,
}

impl RelocateConfig {
    /// The retry policy derived from this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

impl Default for RelocateConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            display_count: DEFAULT_DISPLAY_COUNT,
            hidden_folder_name: DEFAULT_HIDDEN_FOLDER_NAME.to_string(),
            staging_folder_name: DEFAULT_STAGING_FOLDER_NAME.to_string(),
            kill_scope: KillScope::Owner,
        }
    }
}
