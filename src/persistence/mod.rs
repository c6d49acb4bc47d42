//! Persisted preferences and player progress
//!
//! Features:
//! - Key/value store trait with get/set semantics and zero/false defaults
//! - In-memory store for tests and headless runs
//! - JSON file store (native) and LocalStorage store (wasm, see `platform`)
//! - Typed progress view with the unlock rule

use std::collections::HashMap;
use std::fmt;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod progress;

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;
pub use progress::Progress;

/// Store key for the highest level the player may enter
pub const KEY_HIGHEST_UNLOCKED: &str = "highestUnlockedLevelIndex";
/// Store key for the one-time tutorial flag
pub const KEY_TUTORIAL_SHOWN: &str = "hasShownTutorial";

/// Preference storage. Reads never fail: absent or unreadable keys yield the default.
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
    fn get_bool(&self, key: &str) -> bool;
    fn set_bool(&mut self, key: &str, value: bool);
}

/// A stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Int(i64),
    Bool(bool),
}

/// Volatile store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str) -> i64 {
        match self.values.get(key) {
            Some(Value::Int(v)) => *v,
            _ => 0,
        }
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), Value::Int(value));
    }

    fn get_bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(Value::Bool(true)))
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }
}

/// Backing-store failures. Callers log these and carry on with defaults.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Format(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O failed: {}", e),
            StoreError::Format(e) => write!(f, "store contents malformed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Format(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Format(e)
    }
}
