//! NATS transport for gateway event intake.
//!
//! The gateway process publishes every event it receives as a JSON
//! [`RawEvent`] on a single subject (by default `gateway.events`). This
//! transport subscribes to that subject, decodes each payload, and forwards
//! the result to the dispatcher. Payloads that fail to decode are logged
//! and skipped.

use futures::StreamExt as _;
use relay_types::RawEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::transport::Transport;

/// Consumes raw events from a NATS subject.
pub struct NatsTransport {
    url: String,
    subject: String,
    capacity: usize,
    client: Option<async_nats::Client>,
    forwarder: Option<JoinHandle<()>>,
}

impl NatsTransport {
    /// Create an inactive transport for `subject` on the server at `url`.
    ///
    /// `capacity` bounds the queue between the subscription and the
    /// dispatcher (at least one).
    pub fn new(url: impl Into<String>, subject: impl Into<String>, capacity: usize) -> Self {
        Self {
            url: url.into(),
            subject: subject.into(),
            capacity: capacity.max(1),
            client: None,
            forwarder: None,
        }
    }

    /// The subject this transport consumes.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode one message payload into a [`RawEvent`].
///
/// # Errors
///
/// Returns the JSON error if the payload is not a `{type, data}` document.
pub fn decode_payload(payload: &[u8]) -> Result<RawEvent, serde_json::Error> {
    serde_json::from_slice(payload)
}

impl Transport for NatsTransport {
    fn is_active(&self) -> bool {
        self.client.is_some()
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RawEvent>, TransportError> {
        if self.client.is_some() {
            return Err(TransportError::AlreadyActive);
        }

        info!(url = self.url, subject = self.subject, "connecting to NATS server");
        let client = async_nats::connect(self.url.as_str())
            .await
            .map_err(|e| TransportError::Nats(format!("failed to connect to {}: {e}", self.url)))?;
        let mut subscriber = client
            .subscribe(self.subject.clone())
            .await
            .map_err(|e| {
                TransportError::Nats(format!("failed to subscribe to {}: {e}", self.subject))
            })?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let subject = self.subject.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match decode_payload(&msg.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(subject = subject, error = %e, "failed to decode gateway event");
                    }
                }
            }
            debug!(subject = subject, "NATS forwarder finished");
        });

        self.client = Some(client);
        self.forwarder = Some(forwarder);
        info!(subject = self.subject, "subscribed to gateway events");
        Ok(rx)
    }

    /// Flushes pending client traffic, then stops forwarding. If the flush
    /// fails the transport stays active and `stop` can be retried.
    async fn stop(&mut self) -> Result<(), TransportError> {
        let client = self.client.as_ref().ok_or(TransportError::NotActive)?;
        client
            .flush()
            .await
            .map_err(|e| TransportError::Nats(format!("flush failed: {e}")))?;

        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.client = None;
        info!(subject = self.subject, "NATS transport stopped");
        Ok(())
    }
}

impl std::fmt::Debug for NatsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsTransport")
            .field("url", &self.url)
            .field("subject", &self.subject)
            .field("active", &self.client.is_some())
            .finish_non_exhaustive()
    }
}
