//! Storage trait definitions.

use crate::StorageResult;

/// String key-value store with local-storage semantics.
///
/// There is a single logical writer per store; concurrent writers to the
/// same key are not coordinated and the last write wins.
pub trait KeyValueStore: Send + Sync {
    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether a value was present.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
