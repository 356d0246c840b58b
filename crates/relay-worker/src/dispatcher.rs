//! The dispatcher: receives raw events, filters them, and republishes them.
//!
//! Every event the transport delivers goes through [`Dispatcher::receive_event`]:
//!
//! 1. Published on the *received* channel, unconditionally.
//! 2. Dropped if its type is in the ignore list.
//! 3. Passed through the pre-process hook, if any; the hook may rewrite or
//!    drop it.
//! 4. Published on the generic *dispatch* channel and on the channel for
//!    its event type.
//!
//! All channels are [`tokio::sync::broadcast`] channels, so publishing
//! never waits on subscribers. A subscriber that falls behind by more than
//! the configured capacity receives `RecvError::Lagged` and skips ahead.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError};

use relay_types::{DispatcherId, RawEvent};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::error::DispatchError;
use crate::hook::PreProcessHook;
use crate::transport::Transport;

/// Default capacity of each broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Transport plus the task pumping its events into the dispatcher.
struct Consumer<T> {
    transport: T,
    pump: Option<JoinHandle<()>>,
}

/// Receives events from a [`Transport`] and republishes them to subscribers.
pub struct Dispatcher<T: Transport> {
    id: DispatcherId,
    consumer: Mutex<Consumer<T>>,
    ignored_events: HashSet<String>,
    hook: Option<Arc<dyn PreProcessHook>>,
    capacity: usize,
    received: broadcast::Sender<RawEvent>,
    dispatch: broadcast::Sender<RawEvent>,
    typed: std::sync::Mutex<HashMap<String, broadcast::Sender<RawEvent>>>,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher with no ignored events and no hook.
    ///
    /// # Errors
    ///
    /// Never fails with default options; see [`DispatcherBuilder::build`].
    pub fn new(transport: T) -> Result<Self, DispatchError> {
        DispatcherBuilder::new().build(transport)
    }

    /// This dispatcher's identity.
    pub const fn id(&self) -> DispatcherId {
        self.id
    }

    /// Whether the underlying transport is consuming.
    pub async fn consuming(&self) -> bool {
        self.consumer.lock().await.transport.is_active()
    }

    /// Start the transport and pump its events through [`Self::receive_event`].
    ///
    /// The pump task holds a reference to the dispatcher until the
    /// transport's stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyActive`] if already consuming, or
    /// [`DispatchError::Transport`] if the transport fails to start.
    pub async fn start_consuming(self: &Arc<Self>) -> Result<(), DispatchError> {
        let mut consumer = self.consumer.lock().await;
        if consumer.transport.is_active() {
            return Err(DispatchError::AlreadyActive);
        }
        let mut events = consumer.transport.start().await?;

        let dispatcher = Arc::clone(self);
        consumer.pump = Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                dispatcher.receive_event(event).await;
            }
            debug!(dispatcher = %dispatcher.id, "event pump finished");
        }));

        info!(dispatcher = %self.id, "dispatcher started consuming");
        Ok(())
    }

    /// Stop the transport.
    ///
    /// Events the transport had already queued are still dispatched; the
    /// pump exits once the queue is drained.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotActive`] if not consuming, or
    /// [`DispatchError::Transport`] if the transport fails to stop.
    pub async fn stop_consuming(&self) -> Result<(), DispatchError> {
        let mut consumer = self.consumer.lock().await;
        if !consumer.transport.is_active() {
            return Err(DispatchError::NotActive);
        }
        consumer.transport.stop().await?;
        consumer.pump = None;
        info!(dispatcher = %self.id, "dispatcher stopped consuming");
        Ok(())
    }

    /// Run one event through the ignore list, the hook, and the channels.
    pub async fn receive_event(&self, event: RawEvent) {
        let _ = self.received.send(event.clone());

        if self.ignored_events.contains(&event.kind) {
            trace!(event_type = event.kind, "ignored event");
            return;
        }

        let event = match &self.hook {
            Some(hook) => match hook.process(event).await {
                Some(event) => event,
                None => {
                    trace!("event dropped by pre-process hook");
                    return;
                }
            },
            None => event,
        };

        let typed = self
            .typed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind)
            .cloned();

        debug!(event_type = event.kind, "dispatching event");
        match typed {
            Some(tx) => {
                let _ = self.dispatch.send(event.clone());
                let _ = tx.send(event);
            }
            None => {
                let _ = self.dispatch.send(event);
            }
        }
    }

    /// Subscribe to every event as it arrives, before filtering.
    pub fn subscribe_received(&self) -> broadcast::Receiver<RawEvent> {
        self.received.subscribe()
    }

    /// Subscribe to every event that survives filtering.
    pub fn subscribe_dispatch(&self) -> broadcast::Receiver<RawEvent> {
        self.dispatch.subscribe()
    }

    /// Number of live receivers on the dispatch channel.
    pub fn dispatch_subscriber_count(&self) -> usize {
        self.dispatch.receiver_count()
    }

    /// Subscribe to surviving events of one type, e.g. `MESSAGE_CREATE`.
    pub fn subscribe_type(&self, kind: &str) -> broadcast::Receiver<RawEvent> {
        let mut typed = self.typed.lock().unwrap_or_else(PoisonError::into_inner);
        typed
            .entry(kind.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

impl<T: Transport> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("ignored_events", &self.ignored_events)
            .field("has_hook", &self.hook.is_some())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Options for building a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    ignored_events: Vec<String>,
    hook: Option<Arc<dyn PreProcessHook>>,
    capacity: Option<usize>,
}

impl DispatcherBuilder {
    /// Start from defaults: nothing ignored, no hook, [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add event types that are received but never dispatched
    /// (e.g. `TYPING_START`).
    #[must_use]
    pub fn ignored_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_events
            .extend(events.into_iter().map(Into::into));
        self
    }

    /// Install a pre-process hook.
    #[must_use]
    pub fn pre_process_hook(mut self, hook: impl PreProcessHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Capacity of each broadcast channel.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Validate the options and build the dispatcher around `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Options`] if the capacity is zero or an
    /// ignored event type is empty.
    pub fn build<T: Transport>(self, transport: T) -> Result<Dispatcher<T>, DispatchError> {
        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY);
        if capacity == 0 {
            return Err(DispatchError::Options {
                key: "capacity",
                message: "must be greater than zero".to_owned(),
            });
        }
        if self.ignored_events.iter().any(String::is_empty) {
            return Err(DispatchError::Options {
                key: "ignored_events",
                message: "contains an empty event type".to_owned(),
            });
        }

        let (received, _) = broadcast::channel(capacity);
        let (dispatch, _) = broadcast::channel(capacity);
        Ok(Dispatcher {
            id: DispatcherId::new(),
            consumer: Mutex::new(Consumer {
                transport,
                pump: None,
            }),
            ignored_events: self.ignored_events.into_iter().collect(),
            hook: self.hook,
            capacity,
            received,
            dispatch,
            typed: std::sync::Mutex::new(HashMap::new()),
        })
    }
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("ignored_events", &self.ignored_events)
            .field("has_hook", &self.hook.is_some())
            .field("capacity", &self.capacity)
            .finish()
    }
}
