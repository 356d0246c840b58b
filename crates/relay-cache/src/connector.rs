//! The cache connector: translate, filter by policy, commit.
//!
//! A connector owns one store and one policy. It can be fed directly with
//! [`CacheConnector::process`], or attached to any number of dispatchers;
//! each `attach` spawns a task that processes every event from that
//! dispatcher's dispatch channel.
//!
//! # Commit Semantics
//!
//! Mutations from one event are committed strictly in the order the
//! translator produced them. A mutation whose entity type the policy
//! excludes is skipped on its own. The first failed commit stops the batch:
//! earlier mutations stay committed, later ones are not attempted, and the
//! error is returned. There is no retry and no rollback. Events from
//! different dispatchers are not ordered relative to each other; the last
//! write to a key wins.
//!
//! Detaching (or dropping the connector) never interrupts an event that is
//! already being committed. The subscription task finishes that event's
//! batch and then exits without receiving another.
//!
//! A subscription that falls more than the dispatcher's capacity behind
//! skips the oldest events and logs a warning. Skipped events are lost to
//! that subscription, including deletes, so an entry they would have
//! removed stays cached until it is overwritten or deleted again. Size the
//! dispatcher capacity for the worst burst the store has to absorb.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use relay_types::{CachePolicy, DispatcherId, EntityType, Mutation, RawEvent, SubscriptionId};
use relay_worker::{Dispatcher, Transport};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

use crate::error::CacheError;
use crate::store::CacheStore;
use crate::translate::{member_key, translate};

/// One live `attach`. Dropping `stop` ends the subscription task after
/// its current event.
struct Attachment {
    dispatcher: DispatcherId,
    stop: oneshot::Sender<()>,
}

/// Keeps a [`CacheStore`] in step with the events flowing through one or
/// more dispatchers.
pub struct CacheConnector<S: CacheStore> {
    store: Arc<S>,
    policy: CachePolicy,
    subscriptions: std::sync::Mutex<HashMap<SubscriptionId, Attachment>>,
}

impl<S: CacheStore + 'static> CacheConnector<S> {
    /// Create a connector that owns `store`.
    pub fn new(store: S, policy: CachePolicy) -> Self {
        Self::from_shared(Arc::new(store), policy)
    }

    /// Create a connector over a store that is also used elsewhere.
    pub fn from_shared(store: Arc<S>, policy: CachePolicy) -> Self {
        Self {
            store,
            policy,
            subscriptions: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The inclusion policy.
    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Translate `event` and commit every mutation the policy includes.
    ///
    /// Returns the number of mutations committed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Translate`] if the payload is malformed (nothing
    /// is committed), or [`CacheError::Store`] for the first mutation that
    /// fails to commit (the mutations before it remain committed).
    pub async fn process(&self, event: RawEvent) -> Result<usize, CacheError> {
        let kind = event.kind.clone();
        let mutations = translate(event, self.store.as_ref()).await?;

        let mut committed = 0_usize;
        for mutation in mutations {
            let entity = mutation.entity();
            if !self.policy.includes(entity) {
                trace!(
                    event_type = kind,
                    entity = %entity,
                    key = mutation.key(),
                    "skipped by cache policy"
                );
                continue;
            }
            self.commit(mutation).await?;
            committed = committed.saturating_add(1);
        }
        Ok(committed)
    }

    /// Apply one mutation to the store.
    async fn commit(&self, mutation: Mutation) -> Result<(), CacheError> {
        let (action, entity, key, result) = match mutation {
            Mutation::Upsert { entity, key, value } => {
                let result = self.store.write(entity, &key, value).await;
                ("write", entity, key, result)
            }
            Mutation::Delete { entity, key } => {
                let result = self.store.delete(entity, &key).await;
                ("delete", entity, key, result)
            }
        };

        match result {
            Ok(()) => {
                debug!(action, entity = %entity, key, "committed mutation");
                Ok(())
            }
            Err(source) => Err(CacheError::Store {
                action,
                entity,
                key,
                source,
            }),
        }
    }

    /// Subscribe to `dispatcher` and process every event it dispatches.
    ///
    /// Each call creates an independent subscription; attaching the same
    /// dispatcher twice processes its events twice. Must be called from
    /// within a Tokio runtime.
    pub fn attach<T: Transport>(self: &Arc<Self>, dispatcher: &Dispatcher<T>) -> SubscriptionId {
        let id = SubscriptionId::new();
        let dispatcher_id = dispatcher.id();
        let mut events = dispatcher.subscribe_dispatch();
        let connector = Arc::downgrade(self);
        let (stop, mut stopped) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    received = events.recv() => received,
                };
                match received {
                    Ok(event) => {
                        let Some(connector) = connector.upgrade() else {
                            break;
                        };
                        let kind = event.kind.clone();
                        if let Err(e) = connector.process(event).await {
                            error!(
                                subscription = %id,
                                event_type = kind,
                                error = %e,
                                "failed to commit event to cache"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(subscription = %id, skipped, "cache connector lagged behind dispatcher");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(subscription = %id, "cache subscription finished");
        });

        self.lock_subscriptions().insert(
            id,
            Attachment {
                dispatcher: dispatcher_id,
                stop,
            },
        );
        info!(subscription = %id, dispatcher = %dispatcher_id, "cache connector attached");
        id
    }

    /// Remove the subscription created by the matching `attach`.
    ///
    /// An event the subscription is committing when this is called is
    /// committed in full; no later event is processed. Returns `false`, and
    /// changes nothing, if `id` is not a live subscription of this connector.
    pub fn detach(&self, id: SubscriptionId) -> bool {
        let Some(attachment) = self.lock_subscriptions().remove(&id) else {
            return false;
        };
        let _ = attachment.stop.send(());
        info!(
            subscription = %id,
            dispatcher = %attachment.dispatcher,
            "cache connector detached"
        );
        true
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.lock_subscriptions().len()
    }

    /// Live subscriptions on one dispatcher.
    pub fn subscriptions_for(&self, dispatcher: DispatcherId) -> Vec<SubscriptionId> {
        self.lock_subscriptions()
            .iter()
            .filter(|(_, attachment)| attachment.dispatcher == dispatcher)
            .map(|(id, _)| *id)
            .collect()
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, Attachment>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Read API
    // =========================================================================

    /// Read the current entry for (`entity`, `key`).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the store read fails.
    pub async fn get(&self, entity: EntityType, key: &str) -> Result<Option<Value>, CacheError> {
        self.store
            .get(entity, key)
            .await
            .map_err(|source| CacheError::Store {
                action: "get",
                entity,
                key: key.to_owned(),
                source,
            })
    }

    /// Cached guild by id.
    pub async fn get_guild(&self, guild_id: &str) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::Guild, guild_id).await
    }

    /// Cached channel by id.
    pub async fn get_channel(&self, channel_id: &str) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::Channel, channel_id).await
    }

    /// Cached role by id.
    pub async fn get_role(&self, role_id: &str) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::Role, role_id).await
    }

    /// Cached user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::User, user_id).await
    }

    /// Cached membership of `user_id` in `guild_id`.
    pub async fn get_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::Member, &member_key(guild_id, user_id))
            .await
    }

    /// Cached presence of `user_id` in `guild_id`.
    pub async fn get_presence(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<Value>, CacheError> {
        self.get(EntityType::Presence, &member_key(guild_id, user_id))
            .await
    }
}

impl<S: CacheStore + 'static> CacheConnector<S> {
    /// Create a connector with the default policy.
    pub fn with_default_policy(store: S) -> Self {
        Self::new(store, CachePolicy::default())
    }
}

impl<S: CacheStore> std::fmt::Debug for CacheConnector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConnector")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
