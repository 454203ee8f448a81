//! JSON-file-backed settings.
//!
//! The document is a flat JSON object of string values. A missing file reads
//! as empty.

use crate::settings::{KeyValueStore, SettingsError, SettingsResult};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Durable settings persisted to one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SettingsResult<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|source| SettingsError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&self, values: &BTreeMap<String, String>) -> SettingsResult<()> {
        let io_error = |source: std::io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(values).map_err(|source| {
            SettingsError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, text).map_err(io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(io_error)?;
        debug!(
            "event=settings_write module=settings status=ok keys={}",
            values.len()
        );
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> SettingsResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        apply(&mut values);
        self.store(&values)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileStore;
    use crate::settings::{KeyValueStore, SettingsError};

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert_eq!(store.get("currentUserID").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen_and_remove_clears_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        JsonFileStore::new(&path).set("currentUserID", "u-1").unwrap();
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("currentUserID").unwrap().as_deref(), Some("u-1"));

        reopened.remove("currentUserID").unwrap();
        reopened.remove("currentUserID").unwrap();
        assert_eq!(JsonFileStore::new(&path).get("currentUserID").unwrap(), None);
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).get("currentUserID").unwrap_err();
        assert!(matches!(err, SettingsError::Malformed { .. }));
    }
}
