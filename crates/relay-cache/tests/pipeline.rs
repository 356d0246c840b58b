//! End-to-end: channel transport -> dispatcher -> connector -> store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use relay_cache::{CacheConnector, CacheError, CacheStore, MemoryStore, StoreError};
use relay_types::{CachePolicy, EntityType, RawEvent};
use relay_worker::{ChannelTransport, DispatcherBuilder};
use serde_json::{Value, json};

/// Memory store that refuses to write one key.
struct FlakyStore {
    inner: MemoryStore,
    poisoned: String,
}

impl CacheStore for FlakyStore {
    async fn get(&self, entity: EntityType, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(entity, key).await
    }

    async fn write(&self, entity: EntityType, key: &str, value: Value) -> Result<(), StoreError> {
        if key == self.poisoned {
            return Err(StoreError::Config(format!("refusing to write {key}")));
        }
        self.inner.write(entity, key, value).await
    }

    async fn delete(&self, entity: EntityType, key: &str) -> Result<(), StoreError> {
        self.inner.delete(entity, key).await
    }
}

async fn eventually<S: CacheStore + 'static>(
    connector: &CacheConnector<S>,
    entity: EntityType,
    key: &str,
) -> Option<Value> {
    for _ in 0..100 {
        if let Some(value) = connector.get(entity, key).await.unwrap() {
            return Some(value);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn gateway_events_reach_the_cache() {
    let transport = ChannelTransport::new(16);
    let gateway = transport.handle();
    let dispatcher = Arc::new(
        DispatcherBuilder::new()
            .ignored_events(["TYPING_START"])
            .build(transport)
            .unwrap(),
    );
    let cache = Arc::new(CacheConnector::with_default_policy(MemoryStore::new()));

    cache.attach(&dispatcher);
    dispatcher.start_consuming().await.unwrap();

    gateway
        .send(RawEvent::new("GUILD_CREATE", json!({"id": "g", "name": "Relay"})))
        .await
        .unwrap();
    gateway
        .send(RawEvent::new("TYPING_START", json!({"channel_id": "c1"})))
        .await
        .unwrap();
    gateway
        .send(RawEvent::new(
            "CHANNEL_CREATE",
            json!({"id": "c1", "guild_id": "g", "name": "general"}),
        ))
        .await
        .unwrap();
    gateway
        .send(RawEvent::new(
            "GUILD_MEMBER_ADD",
            json!({"guild_id": "g", "user": {"id": "u1", "username": "ada"}, "roles": []}),
        ))
        .await
        .unwrap();

    let guild = eventually(&cache, EntityType::Guild, "g").await.unwrap();
    assert_eq!(guild["name"], "Relay");
    let channel = eventually(&cache, EntityType::Channel, "c1").await.unwrap();
    assert_eq!(channel["name"], "general");
    let member = eventually(&cache, EntityType::Member, "g_u1").await.unwrap();
    assert_eq!(member["user"]["username"], "ada");

    dispatcher.stop_consuming().await.unwrap();
}

#[tokio::test]
async fn ignored_events_never_reach_the_cache() {
    let transport = ChannelTransport::new(16);
    let gateway = transport.handle();
    let dispatcher = Arc::new(
        DispatcherBuilder::new()
            .ignored_events(["GUILD_CREATE"])
            .build(transport)
            .unwrap(),
    );
    let cache = Arc::new(CacheConnector::new(MemoryStore::new(), CachePolicy::all()));
    cache.attach(&dispatcher);
    dispatcher.start_consuming().await.unwrap();

    gateway
        .send(RawEvent::new("GUILD_CREATE", json!({"id": "g"})))
        .await
        .unwrap();
    gateway
        .send(RawEvent::new("USER_UPDATE", json!({"id": "sentinel"})))
        .await
        .unwrap();

    assert!(eventually(&cache, EntityType::User, "sentinel").await.is_some());
    assert_eq!(cache.get_guild("g").await.unwrap(), None);
}

#[tokio::test]
async fn failed_commit_keeps_prefix_and_drops_the_rest() {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        poisoned: "g_b".to_owned(),
    };
    let cache = CacheConnector::new(store, CachePolicy::none().with(EntityType::Member, true));

    let err = cache
        .process(RawEvent::new(
            "GUILD_MEMBERS_CHUNK",
            json!({"guild_id": "g", "members": [{"id": "a"}, {"id": "b"}, {"id": "c"}]}),
        ))
        .await
        .unwrap_err();

    match err {
        CacheError::Store { action, entity, key, .. } => {
            assert_eq!(action, "write");
            assert_eq!(entity, EntityType::Member);
            assert_eq!(key, "g_b");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(cache.get_member("g", "a").await.unwrap().is_some());
    assert_eq!(cache.get_member("g", "b").await.unwrap(), None);
    assert_eq!(cache.get_member("g", "c").await.unwrap(), None);
}

#[tokio::test]
async fn two_dispatchers_feed_one_connector() {
    let first = ChannelTransport::new(8);
    let second = ChannelTransport::new(8);
    let (first_gateway, second_gateway) = (first.handle(), second.handle());
    let first = Arc::new(DispatcherBuilder::new().build(first).unwrap());
    let second = Arc::new(DispatcherBuilder::new().build(second).unwrap());

    let cache = Arc::new(CacheConnector::with_default_policy(MemoryStore::new()));
    let a = cache.attach(&first);
    let b = cache.attach(&second);
    assert_eq!(cache.subscriptions_for(first.id()), vec![a]);
    assert_eq!(cache.subscriptions_for(second.id()), vec![b]);

    first.start_consuming().await.unwrap();
    second.start_consuming().await.unwrap();

    first_gateway
        .send(RawEvent::new("USER_UPDATE", json!({"id": "1"})))
        .await
        .unwrap();
    second_gateway
        .send(RawEvent::new("USER_UPDATE", json!({"id": "2"})))
        .await
        .unwrap();

    assert!(eventually(&cache, EntityType::User, "1").await.is_some());
    assert!(eventually(&cache, EntityType::User, "2").await.is_some());
}
