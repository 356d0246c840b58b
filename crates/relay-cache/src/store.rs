//! The backend store capability.
//!
//! A store is three operations addressed by (entity type, key). Anything
//! that implements them can back a [`crate::CacheConnector`]; the trait
//! makes a store with a missing operation a compile error rather than a
//! runtime one.
//!
//! [`AnyStore`] picks a backend at runtime (from configuration) using enum
//! dispatch, since the trait's async methods are not dyn-compatible.

use std::future::Future;

use relay_types::EntityType;
use serde_json::Value;

use crate::dragonfly::DragonflyStore;
use crate::error::StoreError;
use crate::memory::MemoryStore;

/// Get/write/delete by (entity type, key).
///
/// Implementations must keep entity types apart: the same key under two
/// entity types addresses two different entries.
pub trait CacheStore: Send + Sync {
    /// Read the entry, or `None` if absent.
    fn get(
        &self,
        entity: EntityType,
        key: &str,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Create or overwrite the entry.
    fn write(
        &self,
        entity: EntityType,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove the entry. Removing an absent entry succeeds.
    fn delete(
        &self,
        entity: EntityType,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A store chosen at runtime.
#[derive(Debug)]
pub enum AnyStore {
    /// Process-local store.
    Memory(MemoryStore),
    /// Networked `Dragonfly`/Redis store.
    Dragonfly(DragonflyStore),
}

impl AnyStore {
    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Dragonfly(_) => "dragonfly",
        }
    }
}

impl CacheStore for AnyStore {
    async fn get(&self, entity: EntityType, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            Self::Memory(store) => store.get(entity, key).await,
            Self::Dragonfly(store) => store.get(entity, key).await,
        }
    }

    async fn write(&self, entity: EntityType, key: &str, value: Value) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.write(entity, key, value).await,
            Self::Dragonfly(store) => store.write(entity, key, value).await,
        }
    }

    async fn delete(&self, entity: EntityType, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.delete(entity, key).await,
            Self::Dragonfly(store) => store.delete(entity, key).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn any_store_delegates_to_memory() {
        let store = AnyStore::Memory(MemoryStore::new());
        assert_eq!(store.name(), "memory");
        store
            .write(EntityType::User, "7", json!({"id": "7"}))
            .await
            .unwrap();
        assert_eq!(
            store.get(EntityType::User, "7").await.unwrap(),
            Some(json!({"id": "7"}))
        );
        store.delete(EntityType::User, "7").await.unwrap();
        assert_eq!(store.get(EntityType::User, "7").await.unwrap(), None);
    }
}
