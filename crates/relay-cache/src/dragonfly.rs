//! `Dragonfly` (Redis-compatible) store.
//!
//! Every entry is a single string key holding a JSON document.
//!
//! # Key Pattern
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{entity}_{key}` | JSON | e.g. `guild_1`, `member_g_u` |
//!
//! The entity type is always part of the physical key, so keys never
//! collide across types.

use fred::prelude::*;
use relay_types::EntityType;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::CacheStore;

/// Physical `Dragonfly` key for an entry.
pub fn physical_key(entity: EntityType, key: &str) -> String {
    format!("{entity}_{key}")
}

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL follows the Redis scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("connected to Dragonfly");
        Ok(Self { client })
    }

    /// Wrap an already-initialized client.
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Flush all keys from the instance.
    ///
    /// **WARNING:** This deletes all data, not just cache entries. Only use
    /// for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), StoreError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl CacheStore for DragonflyStore {
    async fn get(&self, entity: EntityType, key: &str) -> Result<Option<Value>, StoreError> {
        let key = physical_key(entity, key);
        let raw: Option<String> = self.client.get(key.as_str()).await?;
        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn write(&self, entity: EntityType, key: &str, value: Value) -> Result<(), StoreError> {
        let key = physical_key(entity, key);
        let json = serde_json::to_string(&value)?;
        let _: () = self
            .client
            .set(key.as_str(), json.as_str(), None, None, false)
            .await?;
        Ok(())
    }

    async fn delete(&self, entity: EntityType, key: &str) -> Result<(), StoreError> {
        let key = physical_key(entity, key);
        let _: u32 = self.client.del(key.as_str()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DragonflyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragonflyStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_key_prefixes_entity_type() {
        assert_eq!(physical_key(EntityType::Guild, "1"), "guild_1");
        assert_eq!(physical_key(EntityType::Member, "g_u"), "member_g_u");
        assert_ne!(
            physical_key(EntityType::Role, "1"),
            physical_key(EntityType::User, "1")
        );
    }
}
