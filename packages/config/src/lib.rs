//! Configuration loading for spaceshift.
//!
//! Every tunable of the transfer engine lives in one immutable
//! [`RelocateConfig`] that callers pass explicitly to each component.
//!
//! # Example
//!
//! ```rust,ignore
//! use spaceshift_config::resolve_config;
//!
//! let config = resolve_config(None)?;
//! let policy = config.retry_policy();
//! println!("{} attempts, {:?} apart", policy.max_retries, policy.delay);
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod discovery;
mod error;
mod toml_loader;
mod types;

pub use discovery::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, default_config_path, resolve_config};
pub use error::ConfigError;
pub use toml_loader::{load_toml_config, validate};
pub use types::{
    DEFAULT_DISPLAY_COUNT, DEFAULT_HIDDEN_FOLDER_NAME, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY_SECS, DEFAULT_STAGING_FOLDER_NAME, KillScope, RelocateConfig,
    RetryPolicy,
};
