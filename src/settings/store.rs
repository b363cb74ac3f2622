//! Key-value storage behind persisted settings

use serde_json::{Map, Value};
use std::cell::RefCell;
#[cfg(test)]
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::SettingsError;

/// Raw string storage. Values are JSON documents serialized by the caller.
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Settings kept as one JSON object on disk, rewritten on every change
#[derive(Debug)]
pub(crate) struct FileStore {
    path: PathBuf,
    entries: RefCell<Map<String, Value>>,
}

impl FileStore {
    /// An unreadable or corrupt file starts out empty; it is replaced on the next write.
    pub(crate) fn open(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        event = "dashboard.settings.file_corrupt",
                        path = %path.display(),
                        error = %e,
                    );
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(
                    event = "dashboard.settings.file_unreadable",
                    path = %path.display(),
                    error = %e,
                );
                Map::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries: RefCell::new(entries),
        }
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&*self.entries.borrow())?;
        fs::write(&self.path, json).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).map(Value::to_string)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let parsed: Value = serde_json::from_str(value)?;
        self.entries.borrow_mut().insert(key.to_string(), parsed);
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let removed = self.entries.borrow_mut().remove(key).is_some();
        if removed { self.flush() } else { Ok(()) }
    }
}
