//! Monitor configuration
//!
//! Stored as JSON. Every field is optional in the file; missing fields take
//! their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::datalog::{ColumnLayout, DEFAULT_CAPACITY};
use crate::link::{DEFAULT_BIND_ADDR, DEFAULT_OFFLINE_THRESHOLD_MS, DEFAULT_POLL_TIMEOUT_MS};

/// Longest allowed poll timeout
pub const MAX_POLL_TIMEOUT_MS: u64 = 5000;

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Config file is not valid JSON for [`MonitorConfig`]
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range
    #[error("Invalid value for '{field}': {message}")]
    Invalid {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

/// Runtime configuration of the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// UDP address to listen on
    pub bind_addr: String,

    /// Directory receiving session logs
    pub log_dir: PathBuf,

    /// Number of readings kept in the rolling window
    pub window_capacity: usize,

    /// Silence after which the board is shown offline, in milliseconds
    pub offline_threshold_ms: u64,

    /// Maximum time a single receive poll waits, in milliseconds
    pub poll_timeout_ms: u64,

    /// Pause between loop iterations, in milliseconds
    pub idle_sleep_ms: u64,

    /// Add the elapsed test time column to the log
    pub elapsed_column: bool,
}

/// Default log directory: `<documents or home>/SensorLinkLogs`
pub fn default_log_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("SensorLinkLogs")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_dir: default_log_dir(),
            window_capacity: DEFAULT_CAPACITY,
            offline_threshold_ms: DEFAULT_OFFLINE_THRESHOLD_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            idle_sleep_ms: 10,
            elapsed_column: false,
        }
    }
}

impl MonitorConfig {
    /// Compact live monitoring: short history, lenient offline detection
    pub fn compact() -> Self {
        Self::default()
    }

    /// Long-duration tests: deeper history, elapsed column, quick offline alarm
    pub fn long_duration() -> Self {
        Self {
            window_capacity: 300,
            offline_threshold_ms: 1000,
            elapsed_column: true,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MonitorConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "bind_addr",
                format!("'{}' is not an address:port", self.bind_addr),
            ));
        }
        if self.window_capacity == 0 {
            return Err(invalid("window_capacity", "must be at least 1"));
        }
        if self.poll_timeout_ms == 0 || self.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(invalid(
                "poll_timeout_ms",
                format!("must be between 1 and {}", MAX_POLL_TIMEOUT_MS),
            ));
        }
        if self.offline_threshold_ms == 0 {
            return Err(invalid("offline_threshold_ms", "must be greater than 0"));
        }
        Ok(())
    }

    /// Poll timeout as a duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Offline threshold as a duration
    pub fn offline_threshold(&self) -> Duration {
        Duration::from_millis(self.offline_threshold_ms)
    }

    /// Idle sleep as a duration
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    /// Log column layout
    pub fn column_layout(&self) -> ColumnLayout {
        if self.elapsed_column {
            ColumnLayout::WithElapsed
        } else {
            ColumnLayout::Standard
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr, "0.0.0.0:5005");
        assert_eq!(config.window_capacity, 100);
        assert_eq!(config.column_layout(), ColumnLayout::Standard);
        assert!(MonitorConfig::long_duration().validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        fs::write(&path, r#"{ "window_capacity": 250, "elapsed_column": true }"#).unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.window_capacity, 250);
        assert_eq!(config.column_layout(), ColumnLayout::WithElapsed);
        assert_eq!(config.poll_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        let mut config = MonitorConfig::long_duration();
        config.log_dir = dir.path().join("logs");

        config.save(&path).unwrap();
        assert_eq!(MonitorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = MonitorConfig::default();
        config.window_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "window_capacity"
        ));

        let mut config = MonitorConfig::default();
        config.bind_addr = "localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.poll_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(MonitorConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            MonitorConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
