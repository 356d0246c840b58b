//! Cache side of the Relay gateway cache.
//!
//! Gateway events arrive from a [`relay_worker::Dispatcher`]. The translator
//! turns each one into an ordered list of [`relay_types::Mutation`]s, the
//! [`CacheConnector`] drops those its [`relay_types::CachePolicy`] excludes,
//! and commits the rest to a [`CacheStore`].
//!
//! ```text
//! Dispatcher --dispatch--> CacheConnector --translate--> [Mutation]
//!                                |                           |
//!                                +------ policy filter <-----+
//!                                |
//!                                v
//!                  CacheStore (MemoryStore | DragonflyStore)
//! ```
//!
//! # Modules
//!
//! - [`translate`] -- Event to mutation mapping
//! - [`connector`] -- Policy filtering, commit, and dispatcher subscriptions
//! - [`store`] -- The store capability and runtime backend selection
//! - [`memory`] -- Process-local store
//! - [`dragonfly`] -- Networked `Dragonfly`/Redis store via `fred`
//! - [`error`] -- Translate, store, and commit errors

pub mod connector;
pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;
pub mod translate;

pub use connector::CacheConnector;
pub use dragonfly::DragonflyStore;
pub use error::{CacheError, StoreError, TranslateError};
pub use memory::MemoryStore;
pub use store::{AnyStore, CacheStore};
pub use translate::{EPOCH_JOINED_AT, member_key, translate};
