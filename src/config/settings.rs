use crate::audit::AuditLogger;
use crate::git::GitExecutor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GitConfig {
    /// Per-invocation deadline; 0 lets commands run until they exit
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_remote")]
    pub default_remote: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct BehaviorConfig {
    #[serde(default)]
    pub log_commands: bool,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_remote() -> String {
    crate::git::DEFAULT_REMOTE.to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            default_remote: default_remote(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("cliborg"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            Err(ConfigError::DirectoryNotFound) => Ok(Self::default_config()),
            Err(e) => Err(e),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        // Validate before saving
        self.validate()?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            git: GitConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        let remote = &self.git.default_remote;
        if remote.is_empty() || remote.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "default_remote must be a non-empty name without whitespace, got {:?}",
                remote
            )));
        }

        Ok(())
    }

    /// Deadline for each git invocation, if any
    pub fn timeout(&self) -> Option<Duration> {
        match self.git.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Build an executor for `repo_path` honouring these settings
    pub fn executor<P: AsRef<Path>>(&self, repo_path: P) -> Result<GitExecutor, ConfigError> {
        let mut executor = GitExecutor::new(repo_path);
        if let Some(timeout) = self.timeout() {
            executor = executor.with_timeout(timeout);
        }
        if self.behavior.log_commands {
            executor = executor.with_audit_log(AuditLogger::new()?);
        }
        Ok(executor)
    }
}
