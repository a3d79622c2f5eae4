//! Configuration management for Shopkeeper
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{MarketError, Result};

/// AWS S3 store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region buckets are created in (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    /// Named credential profile, passed to the SDK loader
    #[serde(default)]
    pub profile: Option<String>,

    /// Endpoint URL (for S3-compatible services)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Allow plain HTTP endpoints
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            profile: None,
            endpoint: None,
            allow_http: false,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Local filesystem store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory holding one subdirectory per market container
    #[serde(default = "default_local_root")]
    pub root: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root: default_local_root(),
        }
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".shopkeeper")
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub local: LocalConfig,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// TOML program declaring markets, producers and datasets
    #[serde(default)]
    pub program_file: Option<PathBuf>,

    /// Where to write prometheus text output after a run
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsConfig::default(),
            local: LocalConfig::default(),
            log_level: default_log_level(),
            program_file: None,
            metrics_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - SHOPKEEPER_AWS_REGION: region for new buckets (default: us-east-1)
    /// - SHOPKEEPER_AWS_PROFILE: credential profile name (optional)
    /// - SHOPKEEPER_AWS_ENDPOINT: custom endpoint URL (optional)
    /// - SHOPKEEPER_AWS_ALLOW_HTTP: true|false (default: false)
    /// - SHOPKEEPER_LOCAL_ROOT: root directory for the local backend
    /// - SHOPKEEPER_LOG_LEVEL: log level (default: info)
    /// - SHOPKEEPER_PROGRAM_FILE: program to run
    /// - SHOPKEEPER_METRICS_FILE: optional metrics output path
    /// - SHOPKEEPER_CONFIG_FILE: optional path to TOML config file
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("SHOPKEEPER_CONFIG_FILE") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MarketError::Config(e.to_string()))
    }

    /// Override fields from a variable lookup
    fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = var("SHOPKEEPER_AWS_REGION") {
            self.aws.region = region;
        }

        if let Some(profile) = var("SHOPKEEPER_AWS_PROFILE") {
            self.aws.profile = Some(profile);
        }

        if let Some(endpoint) = var("SHOPKEEPER_AWS_ENDPOINT") {
            self.aws.endpoint = Some(endpoint);
        }

        if let Some(allow_http) = var("SHOPKEEPER_AWS_ALLOW_HTTP") {
            self.aws.allow_http = allow_http.parse().map_err(|_| {
                MarketError::Config(format!(
                    "SHOPKEEPER_AWS_ALLOW_HTTP must be true or false, got {allow_http}"
                ))
            })?;
        }

        if let Some(root) = var("SHOPKEEPER_LOCAL_ROOT") {
            self.local.root = PathBuf::from(root);
        }

        if let Some(level) = var("SHOPKEEPER_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(program) = var("SHOPKEEPER_PROGRAM_FILE") {
            self.program_file = Some(PathBuf::from(program));
        }

        if let Some(metrics) = var("SHOPKEEPER_METRICS_FILE") {
            self.metrics_file = Some(PathBuf::from(metrics));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.log_level, "info");
        assert!(config.aws.profile.is_none());
        assert_eq!(config.local.root, PathBuf::from(".shopkeeper"));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
            log_level = "debug"

            [aws]
            region = "eu-west-1"
            profile = "platform"
            "#,
        )
        .unwrap();
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.aws.profile.as_deref(), Some("platform"));
        assert!(!config.aws.allow_http);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.local, LocalConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml("[aws]\nregion = \"eu-west-1\"").unwrap();
        let vars = HashMap::from([
            ("SHOPKEEPER_AWS_REGION", "eu-north-1"),
            ("SHOPKEEPER_AWS_ALLOW_HTTP", "true"),
            ("SHOPKEEPER_LOCAL_ROOT", "/tmp/markets"),
        ]);
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.aws.region, "eu-north-1");
        assert!(config.aws.allow_http);
        assert_eq!(config.local.root, PathBuf::from("/tmp/markets"));
    }

    #[test]
    fn test_invalid_bool_is_config_error() {
        let mut config = Config::default();
        let error = config
            .apply_overrides(|name| {
                (name == "SHOPKEEPER_AWS_ALLOW_HTTP").then(|| "sometimes".to_string())
            })
            .unwrap_err();
        assert!(matches!(error, MarketError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            Config::from_toml("log_level = ").unwrap_err(),
            MarketError::Config(_)
        ));
    }
}
