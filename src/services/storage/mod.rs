//! Local persisted storage: a synchronous string key-value capability.
//!
//! The sync coordinator keeps the serialized grid under one fixed key so the
//! schedule survives restarts and works without the realtime channel.

mod sqlite;

pub use sqlite::SqliteStorage;

use std::collections::HashMap;

use anyhow::Result;

pub trait LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Process-local storage, used in tests and as a last-resort fallback when
/// the SQLite file cannot be opened.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut storage = Self::new();
        storage.values.insert(key.into(), value.into());
        storage
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
