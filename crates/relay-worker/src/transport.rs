//! The transport capability and the in-process channel transport.
//!
//! A transport owns the connection to whatever delivers raw events (a
//! message broker, a test harness, another task). Starting it yields a
//! receiver of decoded [`RawEvent`]s; stopping it closes the sending side so
//! the receiver drains and ends.

use std::future::Future;
use std::sync::Arc;

use relay_types::RawEvent;
use tokio::sync::{Mutex, mpsc};

use crate::error::TransportError;

/// A source of raw events.
///
/// Implementations track their own active state. Calling `start` twice or
/// `stop` while inactive is an error, never a silent no-op.
pub trait Transport: Send + 'static {
    /// Whether the transport is currently consuming.
    fn is_active(&self) -> bool;

    /// Connect and begin consuming. Returns the stream of decoded events.
    fn start(
        &mut self,
    ) -> impl Future<Output = Result<mpsc::Receiver<RawEvent>, TransportError>> + Send;

    /// Disconnect and stop consuming.
    fn stop(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Sending side shared between a [`ChannelTransport`] and its handles.
type SenderSlot = Arc<Mutex<Option<mpsc::Sender<RawEvent>>>>;

/// An in-process transport fed through a [`ChannelHandle`].
///
/// Useful for embedding the dispatcher in an application that already
/// receives events some other way, and for tests.
#[derive(Debug)]
pub struct ChannelTransport {
    capacity: usize,
    slot: SenderSlot,
    active: bool,
}

impl ChannelTransport {
    /// Create an inactive transport whose queue holds up to `capacity`
    /// events (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slot: Arc::new(Mutex::new(None)),
            active: false,
        }
    }

    /// A cloneable handle for pushing events into this transport.
    pub fn handle(&self) -> ChannelHandle {
        ChannelHandle {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Transport for ChannelTransport {
    fn is_active(&self) -> bool {
        self.active
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RawEvent>, TransportError> {
        if self.active {
            return Err(TransportError::AlreadyActive);
        }
        let (tx, rx) = mpsc::channel(self.capacity);
        *self.slot.lock().await = Some(tx);
        self.active = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if !self.active {
            return Err(TransportError::NotActive);
        }
        self.slot.lock().await.take();
        self.active = false;
        Ok(())
    }
}

/// Pushes events into a [`ChannelTransport`].
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    slot: SenderSlot,
}

impl ChannelHandle {
    /// Deliver one event, waiting for queue space if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotActive`] if the transport is stopped, or
    /// [`TransportError::Closed`] if the consuming side has gone away.
    pub async fn send(&self, event: RawEvent) -> Result<(), TransportError> {
        let tx = self
            .slot
            .lock()
            .await
            .clone()
            .ok_or(TransportError::NotActive)?;
        tx.send(event)
            .await
            .map_err(|e| TransportError::Closed(e.to_string()))
    }
}
