//! Normalized cache mutations produced by the translator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::entity::EntityType;

/// A single upsert or delete against one cache entry.
///
/// A delete never carries a value; the variant shape enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Mutation {
    /// Create or overwrite the entry at (`entity`, `key`).
    Upsert {
        /// Entity type of the entry.
        entity: EntityType,
        /// Entity key, unique within `entity`.
        key: String,
        /// Document to store.
        value: Value,
    },
    /// Remove the entry at (`entity`, `key`).
    Delete {
        /// Entity type of the entry.
        entity: EntityType,
        /// Entity key, unique within `entity`.
        key: String,
    },
}

impl Mutation {
    /// Build an upsert.
    pub fn upsert(entity: EntityType, key: impl Into<String>, value: Value) -> Self {
        Self::Upsert {
            entity,
            key: key.into(),
            value,
        }
    }

    /// Build a delete.
    pub fn delete(entity: EntityType, key: impl Into<String>) -> Self {
        Self::Delete {
            entity,
            key: key.into(),
        }
    }

    /// Entity type this mutation targets.
    pub const fn entity(&self) -> EntityType {
        match self {
            Self::Upsert { entity, .. } | Self::Delete { entity, .. } => *entity,
        }
    }

    /// Key this mutation targets.
    pub fn key(&self) -> &str {
        match self {
            Self::Upsert { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// Short action name for logging.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn delete_serializes_without_value() {
        let m = Mutation::delete(EntityType::Guild, "1");
        let json = serde_json::to_value(&m).ok();
        assert_eq!(
            json,
            Some(json!({"action": "delete", "entity": "guild", "key": "1"}))
        );
    }

    #[test]
    fn accessors_cover_both_variants() {
        let up = Mutation::upsert(EntityType::Role, "r", json!({"id": "r"}));
        assert_eq!(up.entity(), EntityType::Role);
        assert_eq!(up.key(), "r");
        assert_eq!(up.action(), "upsert");
        let del = Mutation::delete(EntityType::Member, "g_u");
        assert_eq!(del.key(), "g_u");
        assert_eq!(del.action(), "delete");
    }
}
