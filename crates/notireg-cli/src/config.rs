//! Configuration file management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file consulted when `NOTIREG_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/notireg/config.toml";

/// Complete plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Settings store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite settings database.
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub file: String,
}

fn default_db_path() -> String {
    notireg_db::DEFAULT_DB_PATH.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl PluginConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// Falls back to defaults if the file does not exist. `NOTIREG_DB_PATH`
    /// overrides the configured store path.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        let config = Self::load_from(&config_path)?;
        Ok(config.with_db_override(std::env::var("NOTIREG_DB_PATH").ok()))
    }

    /// Load configuration from a specific file, ignoring the environment.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: PluginConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the store path when an override is given.
    pub fn with_db_override(mut self, db_path: Option<String>) -> Self {
        if let Some(path) = db_path.filter(|p| !p.is_empty()) {
            self.store.path = path;
        }
        self
    }

    /// Get the settings database path.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        std::env::var("NOTIREG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}
