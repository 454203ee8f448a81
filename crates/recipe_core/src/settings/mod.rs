//! Small persisted key-value configuration store.
//!
//! # Responsibility
//! - Hold process-independent settings such as the active session id.
//!
//! # Invariants
//! - Reads always observe the latest persisted value; nothing is cached.
//! - File writes replace the whole document atomically (temp file + rename).

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::ErrorKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors from key-value settings access.
#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl SettingsError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Storage
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "settings io error at `{}`: {source}", path.display())
            }
            Self::Malformed { path, source } => {
                write!(f, "malformed settings file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { source, .. } => Some(source),
        }
    }
}

/// String-keyed settings storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> SettingsResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SettingsResult<()>;
    /// Removes `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> SettingsResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        (**self).remove(key)
    }
}
