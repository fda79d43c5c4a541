//! Configuration management for collectd-tagger
//!
//! Handles loading and validating configuration from YAML files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cli::OutputFormat;

/// Prefix used when `collectd_prefix` is not configured
pub const DEFAULT_COLLECTD_PREFIX: &str = r"^collectd\.";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// collectd rule table settings
    #[serde(default)]
    pub collectd: CollectdConfig,

    /// Record output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings consumed by the collectd rule table and its fixups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectdConfig {
    /// Anchored regex every collectd metric name starts with
    ///
    /// Falls back to [`DEFAULT_COLLECTD_PREFIX`] when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collectd_prefix: Option<String>,

    /// Whether collectd already divided counters into per-second rates
    #[serde(rename = "collectd_StoreRates", default)]
    pub store_rates: bool,
}

impl CollectdConfig {
    /// Create a config with the default prefix
    pub fn new(store_rates: bool) -> Self {
        Self {
            collectd_prefix: None,
            store_rates,
        }
    }

    /// Set a custom prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.collectd_prefix = Some(prefix.into());
        self
    }

    /// The configured prefix, or the default one
    pub fn prefix(&self) -> &str {
        self.collectd_prefix
            .as_deref()
            .unwrap_or(DEFAULT_COLLECTD_PREFIX)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Record format written to stdout
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Text
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    ///
    /// # Note
    /// - If the file doesn't exist, returns `ConfigError::ReadError`
    /// - Use `Config::load_or_default()` if you want fallback to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    ///
    /// The prefix has to be anchored and must compile on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(prefix) = self.collectd.collectd_prefix.as_deref() else {
            return Ok(());
        };

        if !prefix.starts_with('^') {
            return Err(ConfigError::ValidationError(format!(
                "collectd_prefix '{}' must be anchored with '^'",
                prefix
            )));
        }

        regex::Regex::new(prefix).map_err(|e| {
            ConfigError::ValidationError(format!(
                "collectd_prefix '{}' is not a valid regex: {}",
                prefix, e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collectd.prefix(), r"^collectd\.");
        assert!(!config.collectd.store_rates);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
collectd:
  collectd_prefix: "^servers\\."
  collectd_StoreRates: true
output:
  format: json
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.collectd.prefix(), r"^servers\.");
        assert!(config.collectd.store_rates);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_store_rates_defaults_to_false() {
        let config = Config::from_yaml("collectd: {}\n").unwrap();
        assert!(!config.collectd.store_rates);
        assert_eq!(config.collectd.collectd_prefix, None);
    }

    #[test]
    fn test_empty_document() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.collectd, CollectdConfig::default());
    }

    #[test]
    fn test_unanchored_prefix_rejected() {
        let mut config = Config::default();
        config.collectd.collectd_prefix = Some(r"collectd\.".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let mut config = Config::default();
        config.collectd.collectd_prefix = Some(r"^collectd(\.".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a valid regex"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/collectd-tagger.yaml").unwrap();
        assert_eq!(config.collectd, CollectdConfig::default());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = Config::load("/nonexistent/collectd-tagger.yaml");
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
