//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and shutdown so
//! `main` can propagate with `?`.

use crate::config::ConfigError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The cache backend could not be set up.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: relay_cache::StoreError,
    },

    /// The dispatcher could not be built, started, or stopped.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: relay_worker::DispatchError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
