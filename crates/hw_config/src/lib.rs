//! `hw_config` - Configuration parsing and validation for hwlab
//!
//! This crate provides:
//! - TOML configuration parsing
//! - Default value handling
//! - Environment variable overrides
//! - Path expansion (`~/` to home directory)
//! - Auto-discovery from standard config paths

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HwConfig {
    /// Global settings
    pub global: GlobalConfig,

    /// Web server settings
    pub web: WebConfig,

    /// Oracle (external prediction service) settings
    pub oracle: OracleConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Path to `DuckDB` database file
    pub db_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logs: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Default database path using XDG directories
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hwlab")
        .join("hwlab.duckdb")
}

/// Expand tilde in path to home directory
#[must_use]
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

impl GlobalConfig {
    /// Expand all paths in `GlobalConfig`
    pub fn expand_paths(&mut self) {
        self.db_path = expand_path(&self.db_path);
    }
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub bind_address: String,

    /// Port
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            cors_enabled: false,
            cors_origins: vec![],
        }
    }
}

/// External prediction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API key for the generative text service. Usually supplied via the
    /// `GEMINI_API_KEY` environment variable rather than the config file.
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Cap on generated output tokens
    pub max_output_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Number of synthetic samples requested by `hwlab seed`
    pub seed_count: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
            max_output_tokens: 4096,
            temperature: 0.4,
            seed_count: 5,
        }
    }
}

impl HwConfig {
    /// Standard config file paths, in order of precedence
    #[must_use]
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // 1. Current directory (project-local)
            PathBuf::from("hwlab.toml"),
        ];

        // 2. User config directory (~/.config/hwlab/hwlab.toml)
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hwlab").join("hwlab.toml"));
        }

        // 3. System config
        paths.push(PathBuf::from("/etc/hwlab/hwlab.toml"));

        paths
    }

    /// Discover and load configuration from standard paths.
    ///
    /// Returns defaults if no config file is found.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a discovered config file cannot be loaded.
    pub fn discover() -> Result<Self, ConfigError> {
        for path in Self::config_paths() {
            if path.exists() {
                info!(path = %path.display(), "Loading config from");
                return Self::load(&path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Discover config and apply environment variable overrides.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if config discovery or validation fails.
    pub fn discover_with_env() -> Result<Self, ConfigError> {
        let mut config = Self::discover()?;
        config.apply_env_overrides();
        config.expand_all_paths();
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: HwConfig = toml::from_str(&content)?;
        config.expand_all_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or validated.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Expand all paths in configuration (resolve `~/` to home directory)
    pub fn expand_all_paths(&mut self) {
        self.global.expand_paths();
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HWLAB_DB_PATH") {
            self.global.db_path = expand_path(&PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HWLAB_LOG_LEVEL") {
            self.global.log_level = val;
        }
        if let Ok(val) = std::env::var("HWLAB_WEB_PORT") {
            if let Ok(port) = val.parse() {
                self.web.port = port;
            }
        }
        if let Ok(val) = std::env::var("HWLAB_WEB_BIND") {
            self.web.bind_address = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            self.oracle.api_key = Some(val);
        }
    }

    /// Validate configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when validation rules are violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.global.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.global.log_level,
                valid_levels.join(", ")
            )));
        }

        // Validate web port
        if self.web.port == 0 {
            return Err(ConfigError::ValidationError(
                "web.port must be > 0".to_string(),
            ));
        }

        // Validate oracle settings
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "oracle.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.oracle.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "oracle.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.oracle.temperature) {
            return Err(ConfigError::ValidationError(
                "oracle.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get oracle request timeout as Duration
    #[must_use]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle.timeout_secs)
    }
}
