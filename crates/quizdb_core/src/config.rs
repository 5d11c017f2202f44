//! Runtime configuration read from the environment.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `QUIZDB_DB_PATH` | SQLite database file | in-memory database |
//! | `QUIZDB_LOG_LEVEL` | `trace\|debug\|info\|warn\|error` | build-mode default |
//! | `QUIZDB_LOG_DIR` | absolute directory for rolling logs | logging disabled |

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "QUIZDB_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "QUIZDB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "QUIZDB_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but holds only whitespace.
    Empty(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "environment variable `{name}` is set but empty"),
        }
    }
}

impl Error for ConfigError {}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
                Some(value) => Ok(Some(value.trim().to_string())),
                None => Ok(None),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            db_path: read(ENV_DB_PATH)?.map(PathBuf::from),
            log_level: read(ENV_LOG_LEVEL)?.unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR)?.map(PathBuf::from),
        })
    }

    /// Starts logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match self.log_dir.as_deref() {
            Some(dir) => init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }

    /// Opens the configured database, falling back to an in-memory one.
    pub fn open_db(&self) -> DbResult<Connection> {
        match self.db_path.as_deref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
