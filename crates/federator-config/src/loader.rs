// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Pick the format from the file extension (`.yaml`, `.yml`, `.json`)
//! 2. Substitute `${VAR}` / `${VAR:default}` placeholders from the environment
//! 3. Parse into [`AppConfig`]
//! 4. Validate

use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::AppConfig;

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use federator_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("federator.yaml").unwrap();
/// println!("{} devices", config.devices.len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    resolve_env_vars: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with environment placeholder substitution enabled.
    pub fn new() -> Self {
        Self {
            resolve_env_vars: true,
        }
    }

    /// Enables or disables environment placeholder substitution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads and validates configuration from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        let config = self
            .parse(&content, format)
            .map_err(|message| ConfigError::parse(path, message))?;
        config.validate()?;

        debug!(
            devices = config.devices.len(),
            tags = config.tag_count(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<AppConfig> {
        let config = self
            .parse(content, format)
            .map_err(|message| ConfigError::parse("<string>", message))?;
        config.validate()?;
        Ok(config)
    }

    fn parse(&self, content: &str, format: ConfigFormat) -> Result<AppConfig, String> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        }
    }
}

/// Substitutes `${VAR}` and `${VAR:default}` from the environment.
///
/// Unknown variables without a default are left in place.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    ConfigLoader::new().load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")).unwrap(), ConfigFormat::Json);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.toml")),
            Err(ConfigError::UnsupportedFormat { ref extension }) if extension == "toml"
        ));
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_placeholders() {
        env::set_var("FEDERATOR_TEST_HOST", "10.1.2.3");
        env::remove_var("FEDERATOR_TEST_MISSING");

        assert_eq!(
            resolve_env_placeholders("host: ${FEDERATOR_TEST_HOST}"),
            "host: 10.1.2.3"
        );
        assert_eq!(
            resolve_env_placeholders("port: ${FEDERATOR_TEST_MISSING:502}"),
            "port: 502"
        );
        assert_eq!(
            resolve_env_placeholders("x: ${FEDERATOR_TEST_MISSING} y"),
            "x: ${FEDERATOR_TEST_MISSING} y"
        );
        assert_eq!(resolve_env_placeholders("cost: $5 ${unclosed"), "cost: $5 ${unclosed");
    }

    #[test]
    fn test_load_from_str_yaml() {
        let yaml = r#"
devices:
  - protocol: modbus_tcp
    device_id: plc-01
    host: 127.0.0.1
    port: 5020
"#;
        let config = ConfigLoader::new().load_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].device_id(), Some("plc-01"));
        assert_eq!(config.devices[0].settings["port"], serde_json::json!(5020));
    }

    #[test]
    fn test_unknown_protocol_is_parse_error() {
        let yaml = "devices:\n  - protocol: bacnet_ip\n    device_id: x\n";
        let err = ConfigLoader::new()
            .load_from_str(yaml, ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
