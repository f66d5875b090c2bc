//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `CHEMLEDGER_*` environment overrides.

use crate::api::ApiConfig;
use crate::ledger::{Identity, LedgerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chemledger").join("config.toml")),
            Some(PathBuf::from("/etc/chemledger/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `CHEMLEDGER_*` environment variables to an existing config
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // Ledger overrides
        if let Some(data_dir) = lookup("CHEMLEDGER_DATA_DIR") {
            self.ledger.data_dir = PathBuf::from(data_dir);
        }
        if let Some(owner) = lookup("CHEMLEDGER_OWNER") {
            self.ledger.owner = Identity::new(owner);
        }
        if let Some(threshold) = lookup("CHEMLEDGER_LOW_STOCK_THRESHOLD") {
            self.ledger.low_stock_threshold = parse_env("CHEMLEDGER_LOW_STOCK_THRESHOLD", &threshold)?;
        }

        // API overrides
        if let Some(host) = lookup("CHEMLEDGER_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("CHEMLEDGER_API_PORT") {
            self.api.port = parse_env("CHEMLEDGER_API_PORT", &port)?;
        }

        // Logging overrides
        if let Some(level) = lookup("CHEMLEDGER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CHEMLEDGER_LOG_FORMAT") {
            self.logging.format = format;
        }

        self.validate()
    }

    /// Reject settings the services cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.owner.is_empty() {
            return Err(ConfigError::Invalid {
                field: "ledger.owner",
                reason: "owner identity must not be empty".to_string(),
            });
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid {
                field: "logging.format",
                reason: format!("expected \"pretty\" or \"json\", got {:?}", self.logging.format),
            });
        }
        if self.api.max_ws_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "api.max_ws_connections",
                reason: "must allow at least one connection".to_string(),
            });
        }
        if self.api.event_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "api.event_buffer",
                reason: "broadcast capacity must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Chemledger Configuration
#
# Environment variables override these settings:
# - CHEMLEDGER_DATA_DIR
# - CHEMLEDGER_OWNER
# - CHEMLEDGER_LOW_STOCK_THRESHOLD
# - CHEMLEDGER_API_HOST
# - CHEMLEDGER_API_PORT
# - CHEMLEDGER_LOG_LEVEL
# - CHEMLEDGER_LOG_FORMAT

[ledger]
# Sole identity allowed to append records
owner = "sensor-gateway"

# Alert when a record's available stock falls below this
low_stock_threshold = 100

# Directory for the journal and manifest
data_dir = "~/.local/share/chemledger"

# Persist records to the journal (false keeps everything in memory)
journal_enabled = true

# Journal fsync strategy: every_write, batched or none
sync_mode = "batched"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty allows any)
cors_origins = []

# Maximum request body size in bytes
max_body_size = 1048576

# Enable the export endpoint
enable_export = true

# Concurrent WebSocket subscribers
max_ws_connections = 1000

# Ledger events buffered per subscriber before it starts skipping
event_buffer = 1024

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
