//! TOML configuration file loading
//!
//! The file is resolved from the command line, then the `SNAPSCAN_CONFIG`
//! environment variable, then the per-user config directory.

use crate::core::error_handling::ContextualError;
use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The only configuration layout version this build understands
pub const CURRENT_VERSION: &str = "1.0";

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "SNAPSCAN_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file unspecified (use --config or SNAPSCAN_CONFIG)")]
    Unspecified,

    #[error("Configuration file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration version not specified")]
    VersionNotSpecified,

    #[error("Unsupported configuration version '{0}' (expected 1.0)")]
    UnsupportedVersion(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Process configuration shared by the dispatcher, receivers and scanners
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    pub version: Option<String>,

    /// Path the configuration was loaded from, if any
    #[serde(skip)]
    pub filename: Option<PathBuf>,

    #[serde(default)]
    pub log: LogConfig,

    pub storage: StorageConfig,

    #[serde(default)]
    pub docker: DockerConfig,

    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Root directory holding the task areas
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DockerConfig {
    /// `unix://`, `tcp://` or `http://` address; local defaults when absent
    pub addr: Option<String>,
    #[serde(default = "default_docker_timeout")]
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            addr: None,
            timeout_secs: default_docker_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TasksConfig {
    /// Upper bound on tasks executing at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Periodic re-poll of the queue area; 0 disables
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl TasksConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.poll_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_docker_timeout() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    30
}

impl Configuration {
    /// Build a configuration with defaults for everything except the storage root
    pub fn with_storage_root(path: impl Into<PathBuf>) -> Self {
        Self {
            version: Some(CURRENT_VERSION.to_string()),
            filename: None,
            log: LogConfig::default(),
            storage: StorageConfig { path: path.into() },
            docker: DockerConfig::default(),
            tasks: TasksConfig::default(),
        }
    }

    /// Parse and validate configuration text
    pub fn parse(contents: &str) -> ConfigResult<Self> {
        let config: Configuration = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a configuration file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;
        config.filename = Some(path.to_path_buf());
        Ok(config)
    }

    /// Work out which configuration file to load
    pub fn resolve_path(cli_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        if let Some(path) = cli_path {
            return Ok(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|d| d.join("snapscan").join("snapscan.toml"))
            .filter(|p| p.exists())
            .ok_or(ConfigError::Unspecified)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match self.version.as_deref() {
            None => return Err(ConfigError::VersionNotSpecified),
            Some(CURRENT_VERSION) => {}
            Some(other) => return Err(ConfigError::UnsupportedVersion(other.to_string())),
        }

        let level = self.log.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "invalid log level '{}', must be one of {:?}",
                    self.log.level, LOG_LEVELS
                ),
            });
        }
        if !LOG_FORMATS.contains(&self.log.format.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "unsupported log format '{}', must be one of {:?}",
                    self.log.format, LOG_FORMATS
                ),
            });
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.path must not be empty".to_string(),
            });
        }
        if self.tasks.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                message: "tasks.max-concurrent must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
