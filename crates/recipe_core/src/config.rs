//! Runtime configuration for the core context.
//!
//! # Responsibility
//! - Resolve the data directory and log level from explicit values or the
//!   process environment.
//! - Derive every on-disk location from the data directory.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "RECIPE_CORE_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "RECIPE_CORE_LOG_LEVEL";

const DB_FILE_NAME: &str = "recipes.sqlite3";
const SETTINGS_FILE_NAME: &str = "settings.json";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    MissingEnv(&'static str),
    RelativeDataDir(PathBuf),
    InvalidLogLevel(String),
    CreateDataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnv(name) => write!(f, "environment variable {name} is not set"),
            Self::RelativeDataDir(path) => {
                write!(f, "data_dir must be absolute, got `{}`", path.display())
            }
            Self::InvalidLogLevel(level) => write!(f, "unsupported log level `{level}`"),
            Self::CreateDataDir { path, source } => write!(
                f,
                "failed to create data directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDataDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Locations and levels the core runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    data_dir: PathBuf,
    log_level: &'static str,
}

impl CoreConfig {
    /// Builds a config rooted at an absolute `data_dir` with the default level.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = data_dir.into();
        if !data_dir.is_absolute() {
            return Err(ConfigError::RelativeDataDir(data_dir));
        }
        Ok(Self {
            data_dir,
            log_level: default_log_level(),
        })
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level =
            normalize_level(level).map_err(|_| ConfigError::InvalidLogLevel(level.to_string()))?;
        Ok(self)
    }

    /// Reads `RECIPE_CORE_DATA_DIR` and optional `RECIPE_CORE_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingEnv(DATA_DIR_ENV))?;
        let config = Self::new(PathBuf::from(data_dir.trim()))?;
        match lookup(LOG_LEVEL_ENV).filter(|value| !value.trim().is_empty()) {
            Some(level) => config.with_log_level(&level),
            None => Ok(config),
        }
    }

    /// Creates the data directory if needed.
    pub fn prepare_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::CreateDataDir {
            path: self.data_dir.clone(),
            source,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_level(&self) -> &'static str {
        self.log_level
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}
