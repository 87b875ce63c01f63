//! TOML configuration file loader.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::RelocateConfig;

/// Load a TOML configuration file.
///
/// Missing keys fall back to their defaults. The loaded configuration is
/// validated before it is returned.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// * If the file cannot be read
/// * If the file cannot be parsed as TOML
/// * If a value fails validation
pub fn load_toml_config(path: &Path) -> Result<RelocateConfig, ConfigError> {
    log::debug!("Loading TOML config from {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: RelocateConfig =
        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    validate(&config)?;

    log::debug!("Loaded config: {config:?}");

    Ok(config)
}

/// Check that every value is usable.
///
/// # Errors
///
/// * If `maxRetries` or `displayCount` is zero
/// * If a folder name is empty or contains a path separator
pub fn validate(config: &RelocateConfig) -> Result<(), ConfigError> {
    if config.max_retries == 0 {
        return Err(ConfigError::InvalidValue {
            key: "maxRetries",
            message: "must be at least 1".to_string(),
        });
    }

    if config.display_count == 0 {
        return Err(ConfigError::InvalidValue {
            key: "displayCount",
            message: "must be at least 1".to_string(),
        });
    }

    check_folder_name("hiddenFolderName", &config.hidden_folder_name)?;
    check_folder_name("stagingFolderName", &config.staging_folder_name)?;

    Ok(())
}

fn check_folder_name(key: &'static str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key,
            message: "must not be empty".to_string(),
        });
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::InvalidValue {
            key,
            message: format!("'{name}' must be a single folder name"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KillScope;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_toml_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
maxRetries = 3
retryDelaySecs = 1
displayCount = 20
hiddenFolderName = "Relocated"
stagingFolderName = "Data"
killScope = "tree-root"
"#
        )
        .unwrap();

        let config = load_toml_config(file.path()).unwrap();

        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_secs, 1);
        assert_eq!(config.display_count, 20);
        assert_eq!(config.hidden_folder_name, "Relocated");
        assert_eq!(config.staging_folder_name, "Data");
        assert_eq!(config.kill_scope, KillScope::TreeRoot);
    }

    #[test]
    fn test_load_minimal_toml_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "displayCount = 5").unwrap();

        let config = load_toml_config(file.path()).unwrap();

        assert_eq!(config.display_count, 5);
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.hidden_folder_name, "AppData");
        assert_eq!(config.kill_scope, KillScope::Owner);
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "maxRetries = 0").unwrap();

        let err = load_toml_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "maxRetries",
                ..
            }
        ));
    }

    #[test]
    fn test_folder_name_with_separator_rejected() {
        let config = RelocateConfig {
            staging_folder_name: "a/b".to_string(),
            ..Default::default()
        };

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "maxRetries = \"many\"").unwrap();

        let err = load_toml_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
    }
}
