//! Configuration loading and typed config structures for the engine.
//!
//! The configuration lives in `relay-config.yaml`. Every section and field
//! has a default, so an empty file (or no file at all) yields a runnable
//! configuration: in-memory cache, default policy, NATS on localhost.

use std::path::Path;

use relay_types::CachePolicy;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
    /// Event intake settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Cache backend and policy.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure URLs:
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Infrastructure connection strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// NATS messaging URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,
}

impl InfrastructureConfig {
    /// Override infrastructure URLs with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override infrastructure URLs from `lookup`, keyed by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("NATS_URL") {
            self.nats_url = val;
        }
        if let Some(val) = lookup("DRAGONFLY_URL") {
            self.dragonfly_url = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            dragonfly_url: default_dragonfly_url(),
        }
    }
}

/// Event intake settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerConfig {
    /// NATS subject the gateway publishes raw events on.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Event types dropped before dispatch.
    #[serde(default)]
    pub ignored_events: Vec<String>,

    /// Queue and broadcast channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            ignored_events: Vec::new(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Which store backs the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local store.
    #[default]
    Memory,
    /// Dragonfly at `infrastructure.dragonfly_url`.
    Dragonfly,
}

/// Cache backend and policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Store backend.
    #[serde(default)]
    pub backend: CacheBackend,

    /// Entity types to persist, keyed by plural name.
    #[serde(default)]
    pub policy: CachePolicy,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_subject() -> String {
    "gateway.events".to_owned()
}

const fn default_channel_capacity() -> usize {
    relay_worker::DEFAULT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use relay_types::EntityType;

    use super::*;

    #[test]
    fn defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.worker.subject, "gateway.events");
        assert_eq!(config.worker.channel_capacity, 1024);
        assert!(config.worker.ignored_events.is_empty());
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.policy, CachePolicy::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
infrastructure:
  nats_url: nats://nats:4222
  dragonfly_url: redis://dragonfly:6379
worker:
  subject: shard.0.events
  ignored_events:
    - TYPING_START
    - PRESENCE_UPDATE
  channel_capacity: 256
cache:
  backend: dragonfly
  policy:
    guilds: true
    members: false
    emojis: true
    stickers: true
logging:
  level: debug
  json: true
";
        let mut config: RelayConfig = serde_yml::from_str(yaml).unwrap();
        config.infrastructure.apply_overrides(|_| None);

        assert_eq!(config.infrastructure.nats_url, "nats://nats:4222");
        assert_eq!(config.infrastructure.dragonfly_url, "redis://dragonfly:6379");
        assert_eq!(config.worker.subject, "shard.0.events");
        assert_eq!(
            config.worker.ignored_events,
            vec!["TYPING_START".to_owned(), "PRESENCE_UPDATE".to_owned()]
        );
        assert_eq!(config.worker.channel_capacity, 256);
        assert_eq!(config.cache.backend, CacheBackend::Dragonfly);
        assert!(config.cache.policy.includes(EntityType::Guild));
        assert!(config.cache.policy.includes(EntityType::Emoji));
        assert!(!config.cache.policy.includes(EntityType::Member));
        assert!(!config.cache.policy.includes(EntityType::Channel));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: RelayConfig = serde_yml::from_str("worker:\n  subject: other\n").unwrap();
        assert_eq!(config.worker.subject, "other");
        assert_eq!(config.worker.channel_capacity, 1024);
        assert_eq!(config.cache.policy, CachePolicy::default());
    }

    #[test]
    fn env_overrides_replace_urls() {
        let mut infra = InfrastructureConfig::default();
        infra.apply_overrides(|key| match key {
            "NATS_URL" => Some("nats://override:4222".to_owned()),
            _ => None,
        });
        assert_eq!(infra.nats_url, "nats://override:4222");
        assert_eq!(infra.dragonfly_url, "redis://localhost:6379");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = serde_yml::from_str::<RelayConfig>("cache:\n  backend: postgres\n");
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RelayConfig::from_file(Path::new("/nonexistent/relay-config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
