//! Configuration file management for certwatch.
//!
//! This module handles loading, parsing, and merging configuration from TOML
//! files and command-line arguments. Settings can be specified in multiple
//! places with clear precedence rules.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certwatch.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! hosts = ["example.com", "example.com:8443"]
//! warning_days = 14
//! timeout = 30
//! output = "summary"
//! exit_code = 1
//!
//! [warning_overrides]
//! "api.example.com" = 7
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use crate::{DEFAULT_TIMEOUT_SECS, DEFAULT_WARNING_DAYS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for certwatch.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI arguments.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// List of target specs to check (`host`, `host:port`, or URL form)
    pub hosts: Option<Vec<String>>,
    /// Global expiry warning window in days
    pub warning_days: Option<u32>,
    /// Connect + handshake timeout in seconds
    pub timeout: Option<u64>,
    /// Output format: json, text, summary
    pub output: Option<String>,
    /// Exit code to use when any host is unhealthy
    pub exit_code: Option<i32>,
    /// Per-host warning window overrides, keyed by hostname
    pub warning_overrides: Option<HashMap<String, u32>>,
    /// Prometheus configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus integration configuration.
///
/// Controls whether check results are pushed to a Prometheus Push Gateway
/// and specifies the gateway address.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrometheusConfig {
    /// Enable prometheus metrics pushing
    pub enabled: Option<bool>,
    /// Prometheus push gateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
}

impl Default for Config {
    /// Sensible defaults: no hosts (must be provided), summary output, exit
    /// code 1 on unhealthy hosts, 14-day warning window, 30-second timeout,
    /// prometheus disabled.
    fn default() -> Self {
        Config {
            hosts: None,
            warning_days: Some(DEFAULT_WARNING_DAYS),
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            output: Some("summary".to_string()),
            exit_code: Some(1),
            warning_overrides: None,
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current value.
    ///
    /// # Arguments
    ///
    /// * `other` - Configuration to merge (takes priority)
    ///
    /// # Returns
    ///
    /// The merged configuration with `other`'s values taking precedence.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.hosts.is_some() {
            self.hosts = other.hosts;
        }
        if other.warning_days.is_some() {
            self.warning_days = other.warning_days;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if other.warning_overrides.is_some() {
            self.warning_overrides = other.warning_overrides;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Converts CLI arguments into a Config structure that can be merged
    /// with file-based and default configurations. Only provided arguments
    /// (Some values) will override other configurations.
    pub fn from_cli_args(
        hosts: Option<Vec<String>>,
        warning_days: Option<u32>,
        timeout: Option<u64>,
        output: Option<String>,
        exit_code: Option<i32>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
    ) -> Self {
        Config {
            hosts,
            warning_days,
            timeout,
            output,
            exit_code,
            warning_overrides: None,
            prometheus: Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
            }),
        }
    }

    /// The warning window to apply to `host`: the per-host override when one
    /// is configured, else the global value, else the built-in default.
    pub fn warning_days_for(&self, host: &str) -> u32 {
        self.warning_overrides
            .as_ref()
            .and_then(|overrides| overrides.get(host).copied())
            .or(self.warning_days)
            .unwrap_or(DEFAULT_WARNING_DAYS)
    }

    /// Generates an example configuration file in TOML format.
    ///
    /// Creates a sample configuration with all available options set to
    /// example values. Useful for bootstrapping a new configuration file.
    pub fn example_toml() -> String {
        let example = Config {
            hosts: Some(vec![
                "example.com".to_string(),
                "example.com:8443".to_string(),
                "https://secure.example.com:9443".to_string(),
                "expired.badssl.com".to_string(),
            ]),
            warning_days: Some(DEFAULT_WARNING_DAYS),
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            output: Some("summary".to_string()),
            exit_code: Some(1),
            warning_overrides: Some(HashMap::from([("api.example.com".to_string(), 7)])),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            hosts = ["example.com", "example.org:8443"]
            warning_days = 30
            timeout = 10
            output = "json"
            exit_code = 2

            [warning_overrides]
            "api.example.com" = 7

            [prometheus]
            enabled = true
            address = "http://localhost:9092"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(
            config.hosts,
            Some(vec![
                "example.com".to_string(),
                "example.org:8443".to_string()
            ])
        );
        assert_eq!(config.warning_days, Some(30));
        assert_eq!(config.timeout, Some(10));
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.exit_code, Some(2));
        assert_eq!(config.warning_days_for("api.example.com"), 7);
        assert_eq!(config.warning_days_for("example.com"), 30);

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true));
        assert_eq!(
            prometheus.address,
            Some("http://localhost:9092".to_string())
        );
    }

    #[test]
    fn test_config_merge() {
        let base_config = Config {
            hosts: Some(vec!["base.com".to_string()]),
            warning_days: Some(14),
            timeout: Some(30),
            output: Some("text".to_string()),
            exit_code: Some(0),
            warning_overrides: None,
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://base:9091".to_string()),
            }),
        };

        let override_config = Config {
            hosts: Some(vec!["override.com".to_string()]),
            warning_days: None,
            timeout: Some(5),
            output: None,
            exit_code: Some(1),
            warning_overrides: Some(HashMap::from([("override.com".to_string(), 3)])),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: None,
            }),
        };

        let merged = base_config.merge_with(override_config);

        // Override config should take precedence where specified
        assert_eq!(merged.hosts, Some(vec!["override.com".to_string()]));
        assert_eq!(merged.warning_days, Some(14)); // From base (not overridden)
        assert_eq!(merged.timeout, Some(5)); // Overridden
        assert_eq!(merged.output, Some("text".to_string())); // From base
        assert_eq!(merged.exit_code, Some(1)); // Overridden
        assert_eq!(merged.warning_days_for("override.com"), 3);

        let prometheus = merged.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true)); // Overridden
        assert_eq!(prometheus.address, Some("http://base:9091".to_string())); // From base
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.hosts, None);
        assert_eq!(config.warning_days, Some(DEFAULT_WARNING_DAYS));
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.output, Some("summary".to_string()));
        assert_eq!(config.exit_code, Some(1));
        assert_eq!(config.warning_days_for("anything.example"), DEFAULT_WARNING_DAYS);

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(false));
        assert_eq!(
            prometheus.address,
            Some("http://localhost:9091".to_string())
        );
    }

    #[test]
    fn test_config_from_cli_args() {
        let config = Config::from_cli_args(
            Some(vec!["cli.com".to_string()]),
            Some(21),
            Some(15),
            Some("json".to_string()),
            Some(2),
            Some(true),
            Some("http://cli:9091".to_string()),
        );

        assert_eq!(config.hosts, Some(vec!["cli.com".to_string()]));
        assert_eq!(config.warning_days, Some(21));
        assert_eq!(config.timeout, Some(15));
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.exit_code, Some(2));

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true));
        assert_eq!(prometheus.address, Some("http://cli:9091".to_string()));
    }

    #[test]
    fn test_invalid_toml() {
        let invalid_toml = "hosts = [invalid toml";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::from_file(temp_file.path());
        assert!(result.is_err());

        match result.unwrap_err() {
            ConfigError::Parse(_) => {} // Expected
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_example_toml_generation() {
        let example = Config::example_toml();

        // Should be valid TOML
        let parsed: Config = toml::from_str(&example).unwrap();

        // Should contain expected fields
        assert!(parsed.hosts.is_some());
        assert!(parsed.output.is_some());
        assert!(parsed.warning_overrides.is_some());
        assert!(parsed.prometheus.is_some());
    }
}
