//! Event intake for the Relay gateway cache.
//!
//! A [`Transport`] delivers raw gateway events (from NATS in production, or
//! from an in-process channel). A [`Dispatcher`] receives them, applies the
//! ignore list and pre-process hook, and republishes survivors on broadcast
//! channels that any number of subscribers -- typically cache connectors --
//! consume independently.
//!
//! ```text
//! NATS / channel --> Transport --> Dispatcher --+--> received channel
//!                                               +--> dispatch channel --> subscribers
//!                                               +--> per-type channels
//! ```
//!
//! # Modules
//!
//! - [`transport`] -- The transport trait and the in-process channel transport
//! - [`nats`] -- NATS subject transport
//! - [`dispatcher`] -- Filtering and republishing
//! - [`hook`] -- Pre-process hook trait
//! - [`error`] -- Transport and dispatch errors

pub mod dispatcher;
pub mod error;
pub mod hook;
pub mod nats;
pub mod transport;

pub use dispatcher::{DEFAULT_CAPACITY, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, TransportError};
pub use hook::PreProcessHook;
pub use nats::NatsTransport;
pub use transport::{ChannelHandle, ChannelTransport, Transport};
