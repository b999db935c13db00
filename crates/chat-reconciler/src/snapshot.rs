//! Persisted conversation snapshot.

use crate::{ConversationMap, ReconcileResult};
use console_storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Storage key holding the serialized conversation map.
pub const HISTORY_KEY: &str = "chat_history";

/// Reads and writes the [`ConversationMap`] mirror.
///
/// Both directions fail soft: a missing, unreadable or corrupt snapshot loads
/// as empty, and a failed write is logged while the in-memory state stays
/// authoritative.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub fn load(&self) -> ConversationMap {
        match self.try_load() {
            Ok(Some(map)) => {
                debug!(key = %self.key, conversations = map.len(), "Loaded snapshot");
                map
            }
            Ok(None) => ConversationMap::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable snapshot");
                ConversationMap::new()
            }
        }
    }

    /// Returns whether the snapshot was written.
    pub fn save(&self, conversations: &ConversationMap) -> bool {
        match self.try_save(conversations) {
            Ok(()) => true,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to persist snapshot");
                false
            }
        }
    }

    fn try_load(&self) -> ReconcileResult<Option<ConversationMap>> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn try_save(&self, conversations: &ConversationMap) -> ReconcileResult<()> {
        let raw = serde_json::to_string(conversations)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}
