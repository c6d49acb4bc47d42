//! JSON file store for native builds
//!
//! The whole map is rewritten on every set. Single writer, last write wins.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{KeyValueStore, StoreError};

/// Preferences persisted as one JSON object
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Open a store, starting empty if the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => {
                log::info!("Loaded {} preferences from {}", values.len(), path.display());
                values
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No preferences at {}, starting fresh", path.display());
                Map::new()
            }
            Err(e) => {
                log::warn!("Ignoring preferences at {}: {}", path.display(), e);
                Map::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Map<String, Value>, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        if let Err(e) = self.write() {
            log::warn!("Failed to save preferences to {}: {}", self.path.display(), e);
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_int(&self, key: &str) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, Value::from(value));
    }

    fn get_bool(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, Value::from(value));
    }
}
