//! In-memory store.

use crate::{validate_key, KeyValueStore, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.data.lock().insert(key.to_string(), value.to_string());
        store
    }

    /// Make subsequent writes fail, simulating an exhausted quota.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock() = read_only;
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        if *self.read_only.lock() {
            return Err(StorageError::Unavailable("store is read-only".to_string()));
        }
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.data.lock().remove(key).is_some())
    }
}
