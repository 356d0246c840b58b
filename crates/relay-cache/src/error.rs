//! Error types for translation, storage, and commit.
//!
//! Backend failures surface as [`StoreError`]. The connector wraps them in
//! [`CacheError::Store`] together with the mutation that failed, so a caller
//! of `process` knows where in the batch the commit stopped.

use relay_types::EntityType;

/// Errors raised by a backend store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A value could not be serialized for, or parsed from, the backend.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A recognized event whose payload lacks a field the translator needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    /// A required id field is absent, empty, or not a string/number.
    #[error("{event} is missing required field `{field}`")]
    MissingField {
        /// The event type tag.
        event: String,
        /// Dotted path of the missing field.
        field: String,
    },
}

/// Errors surfaced by [`crate::CacheConnector`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The event could not be translated; nothing was committed.
    #[error("translate error: {0}")]
    Translate(#[from] TranslateError),

    /// A mutation failed to commit. Earlier mutations from the same event
    /// are committed; later ones were not attempted.
    #[error("failed to {action} {entity} {key}: {source}")]
    Store {
        /// `write`, `delete`, or `get`.
        action: &'static str,
        /// Entity type of the failed mutation.
        entity: EntityType,
        /// Key of the failed mutation.
        key: String,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },
}
