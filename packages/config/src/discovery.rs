//! Configuration file discovery.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::toml_loader::load_toml_config;
use crate::types::RelocateConfig;

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "spaceshift";
/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Path of the per-user configuration file, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve the configuration to use.
///
/// An explicit path must exist and parse. Without one, the per-user file is
/// used when present; otherwise the defaults apply.
///
/// # Errors
///
/// * If the explicit or discovered file cannot be read or parsed
pub fn resolve_config(explicit: Option<&Path>) -> Result<RelocateConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            log::debug!("Using config file {}", path.display());
            load_toml_config(&path)
        }
        _ => {
            log::debug!("No config file found, using defaults");
            Ok(RelocateConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "retryDelaySecs = 0\n").unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        assert_eq!(config.retry_delay_secs, 0);
    }

    #[test]
    fn test_resolve_missing_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");

        let err = resolve_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_default_config_path_layout() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("spaceshift/config.toml"));
        }
    }
}
