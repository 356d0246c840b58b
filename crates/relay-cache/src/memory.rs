//! Process-local store.
//!
//! Entries live in a map of maps, first by entity type and then by key.
//! Nothing is serialized and nothing survives the process, so this store
//! is only suitable when a single worker owns the cache.

use std::collections::HashMap;

use relay_types::EntityType;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::CacheStore;

/// In-memory [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<EntityType, HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all entity types.
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().map(HashMap::len).sum()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl CacheStore for MemoryStore {
    async fn get(&self, entity: EntityType, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&entity)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn write(&self, entity: EntityType, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .entry(entity)
            .or_default()
            .insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, entity: EntityType, key: &str) -> Result<(), StoreError> {
        if let Some(entries) = self.entries.write().await.get_mut(&entity) {
            entries.remove(key);
        }
        Ok(())
    }
}
