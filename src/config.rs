//! Configuration
//!
//! The main config is a TOML file selecting the query surface's port, the
//! per-query caps, and which ingestion consumers run (each with its own
//! config file). Environment variables override the basics.
//!
//! ```toml
//! port = 8070
//! query_limit = 25
//! result_limit = 10000
//!
//! [consumers]
//! stream = "stream.toml"
//! httpapi = "httpapi.toml"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port for the query surface.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of tags in one query.
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,

    /// Maximum number of metrics one query may return.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Consumer name → path to that consumer's config file.
    #[serde(default)]
    pub consumers: HashMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_port() -> u16 {
    8070
}

fn default_query_limit() -> usize {
    25
}

fn default_result_limit() -> usize {
    10_000
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: pretty (for development) or json (for production)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            query_limit: default_query_limit(),
            result_limit: default_result_limit(),
            consumers: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read(path)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("ATLAS_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Ok(limit) = std::env::var("ATLAS_QUERY_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.query_limit = l;
            }
        }
        if let Ok(limit) = std::env::var("ATLAS_RESULT_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.result_limit = l;
            }
        }
        if let Ok(level) = std::env::var("ATLAS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ATLAS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Read and parse any TOML config file; consumers use this for their own
/// config files.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}
