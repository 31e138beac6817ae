//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line arguments
//! 2. Environment variables (merged into the overrides by clap)
//! 3. TOML configuration file
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; missing values fall through to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Bind address
    #[serde(default)]
    pub host: Option<String>,

    /// Database connection string (e.g. `sqlite://kotoba.db?mode=rwc`).
    /// Unset selects the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Seed the four demo cards into an empty store
    #[serde(default)]
    pub seed_sample_data: Option<bool>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line (and environment) overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub database_url: Option<String>,
    pub seed_sample_data: Option<bool>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub seed_sample_data: bool,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            seed_sample_data: true,
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Resolve configuration from overrides, TOML file and defaults
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly named config file is missing, or if
    /// any config file cannot be parsed.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = load_toml_config(overrides.config_path.as_deref())?;
        Ok(Self::merge(overrides, toml_config))
    }

    /// Combine overrides with an already loaded TOML config
    pub fn merge(overrides: ConfigOverrides, toml_config: TomlConfig) -> Self {
        let defaults = Self::default();

        // An empty connection string means "no database"
        let database_url = overrides
            .database_url
            .or(toml_config.database_url)
            .filter(|url| !url.trim().is_empty());

        Self {
            host: overrides.host.or(toml_config.host).unwrap_or(defaults.host),
            port: overrides.port.or(toml_config.port).unwrap_or(defaults.port),
            database_url,
            seed_sample_data: overrides
                .seed_sample_data
                .or(toml_config.seed_sample_data)
                .unwrap_or(defaults.seed_sample_data),
            log_level: overrides.log_level.unwrap_or(toml_config.logging.level),
        }
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load a TOML config file
///
/// With an explicit path the file must exist. Without one, the platform
/// default (`<config_dir>/kotoba/config.toml`) is used if present.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Platform config file location, e.g. `~/.config/kotoba/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kotoba").join("config.toml"))
}
