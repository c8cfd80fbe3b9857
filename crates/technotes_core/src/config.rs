//! Runtime configuration for hosts embedding the note core.
//!
//! Values come from `TECHNOTES_*` environment variables; anything unset
//! falls back to defaults.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TECHNOTES_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TECHNOTES_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TECHNOTES_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "technotes.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(LoggingError),
    EmptyValue(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(err) => write!(f, "{err}"),
            Self::EmptyValue(key) => write!(f, "`{key}` is set but empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            Self::EmptyValue(_) => None,
        }
    }
}

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite database file backing the Users/Notes collections.
    pub db_path: PathBuf,
    /// Canonical log level name.
    pub log_level: String,
    /// Absolute directory for rolling log files. File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(non_empty(ENV_DB_PATH, value)?);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.log_level = non_empty(ENV_LOG_LEVEL, value)?;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(non_empty(ENV_LOG_DIR, value)?));
        }

        config.validate()?;
        Ok(config)
    }

    /// Normalizes the log level in place.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();
        Ok(())
    }
}

fn non_empty(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyValue(key))
    } else {
        Ok(value)
    }
}
