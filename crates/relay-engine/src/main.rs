//! Relay engine binary.
//!
//! Consumes raw gateway events from NATS and keeps a cache of guilds,
//! channels, roles, members, users, and presences in step with them. It
//! loads configuration, wires transport, dispatcher, connector, and store
//! together, and runs until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `relay-config.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Open the cache backend (memory or Dragonfly)
//! 4. Create the cache connector with the configured policy
//! 5. Build the dispatcher over a NATS transport
//! 6. Attach the connector and start consuming
//! 7. Wait for Ctrl-C, then detach and stop

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use relay_cache::{AnyStore, CacheConnector, DragonflyStore, MemoryStore};
use relay_worker::{DispatcherBuilder, NatsTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{CacheBackend, LoggingConfig, RelayConfig};
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "relay-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails, or if the dispatcher
/// cannot be stopped cleanly on shutdown.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("relay-engine starting");
    info!(
        source = config_source,
        nats_url = config.infrastructure.nats_url,
        subject = config.worker.subject,
        backend = ?config.cache.backend,
        "Configuration loaded"
    );

    // 3. Open the cache backend.
    let store = open_store(&config).await?;
    info!(backend = store.name(), "Cache backend ready");

    // 4. Create the cache connector.
    let connector = Arc::new(CacheConnector::new(store, config.cache.policy.clone()));

    // 5. Build the dispatcher.
    let transport = NatsTransport::new(
        config.infrastructure.nats_url.as_str(),
        config.worker.subject.as_str(),
        config.worker.channel_capacity,
    );
    let dispatcher = Arc::new(
        DispatcherBuilder::new()
            .ignored_events(config.worker.ignored_events.iter().cloned())
            .capacity(config.worker.channel_capacity)
            .build(transport)
            .map_err(EngineError::from)?,
    );

    // 6. Attach and start consuming.
    let subscription = connector.attach(&dispatcher);
    dispatcher
        .start_consuming()
        .await
        .map_err(EngineError::from)?;
    info!(dispatcher = %dispatcher.id(), "relay-engine running, press Ctrl-C to stop");

    // 7. Wait for shutdown.
    tokio::signal::ctrl_c().await.map_err(EngineError::from)?;
    info!("Shutdown requested");

    connector.detach(subscription);
    dispatcher
        .stop_consuming()
        .await
        .map_err(EngineError::from)?;
    info!("relay-engine stopped");
    Ok(())
}

/// Load configuration from the first argument or [`CONFIG_FILE`].
///
/// A missing default file falls back to defaults (plus environment
/// overrides). A missing file named explicitly is an error.
fn load_config() -> Result<(RelayConfig, String), EngineError> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let config = RelayConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        Ok((RelayConfig::from_file(&path)?, CONFIG_FILE.to_owned()))
    } else {
        Ok((RelayConfig::parse("")?, "defaults".to_owned()))
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open the configured store.
async fn open_store(config: &RelayConfig) -> Result<AnyStore, EngineError> {
    Ok(match config.cache.backend {
        CacheBackend::Memory => AnyStore::Memory(MemoryStore::new()),
        CacheBackend::Dragonfly => {
            info!(url = config.infrastructure.dragonfly_url, "Connecting to Dragonfly");
            AnyStore::Dragonfly(DragonflyStore::connect(&config.infrastructure.dragonfly_url).await?)
        }
    })
}
