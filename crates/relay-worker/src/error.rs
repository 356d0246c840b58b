//! Error types for event intake.
//!
//! [`TransportError`] covers the broker connection itself.
//! [`DispatchError`] is what callers of the dispatcher see: bad options at
//! construction, start/stop called in the wrong state, or a wrapped
//! transport failure.

/// Errors raised by a [`crate::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `start` was called while already consuming.
    #[error("transport is already active")]
    AlreadyActive,

    /// `stop` (or a send) was attempted while not consuming.
    #[error("transport is not active")]
    NotActive,

    /// The in-process event channel was closed by the receiving side.
    #[error("transport channel closed: {0}")]
    Closed(String),

    /// Connecting to or communicating with the NATS server failed.
    #[error("NATS error: {0}")]
    Nats(String),
}

/// Errors raised by a [`crate::Dispatcher`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A construction option was invalid.
    #[error("bad option \"{key}\": {message}")]
    Options {
        /// The option that was misconfigured.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// `start_consuming` was called while the transport is active.
    #[error("transport is already active")]
    AlreadyActive,

    /// `stop_consuming` was called while the transport is inactive.
    #[error("transport is not active")]
    NotActive,

    /// The underlying transport failed to start or stop.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: TransportError,
    },
}
