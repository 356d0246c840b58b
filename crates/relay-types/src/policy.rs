//! Per-entity-type inclusion policy.
//!
//! A policy maps plural entity names (`guilds`, `members`, ...) to a flag
//! that decides whether mutations of that type are persisted. Unknown names
//! are dropped while parsing; a type missing from the policy is excluded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

/// Which entity types a cache connector persists.
///
/// Immutable once handed to a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct CachePolicy {
    include: BTreeMap<EntityType, bool>,
}

impl CachePolicy {
    /// A policy that excludes every entity type.
    pub const fn none() -> Self {
        Self {
            include: BTreeMap::new(),
        }
    }

    /// A policy that includes every entity type.
    pub fn all() -> Self {
        EntityType::ALL.into_iter().map(|t| (t, true)).collect()
    }

    /// Return a copy of this policy with `entity` set to `include`.
    #[must_use]
    pub fn with(mut self, entity: EntityType, include: bool) -> Self {
        self.include.insert(entity, include);
        self
    }

    /// Whether mutations of `entity` are persisted.
    pub fn includes(&self, entity: EntityType) -> bool {
        self.include.get(&entity).copied().unwrap_or(false)
    }

    /// Look up a plural entity name. Unknown names are never included.
    pub fn includes_name(&self, plural: &str) -> bool {
        EntityType::from_plural(plural).is_some_and(|t| self.includes(t))
    }
}

impl Default for CachePolicy {
    /// Channels, guilds, members, roles, and users are cached; messages,
    /// presences, and emojis are not.
    fn default() -> Self {
        [
            (EntityType::Channel, true),
            (EntityType::Guild, true),
            (EntityType::Member, true),
            (EntityType::Message, false),
            (EntityType::Presence, false),
            (EntityType::Role, true),
            (EntityType::User, true),
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<(EntityType, bool)> for CachePolicy {
    fn from_iter<I: IntoIterator<Item = (EntityType, bool)>>(iter: I) -> Self {
        Self {
            include: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, bool>> for CachePolicy {
    fn from(raw: BTreeMap<String, bool>) -> Self {
        raw.into_iter()
            .filter_map(|(name, include)| EntityType::from_plural(&name).map(|t| (t, include)))
            .collect()
    }
}

impl From<CachePolicy> for BTreeMap<String, bool> {
    fn from(policy: CachePolicy) -> Self {
        policy
            .include
            .into_iter()
            .map(|(t, include)| (t.plural().to_owned(), include))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_levels() {
        let policy = CachePolicy::default();
        assert!(policy.includes(EntityType::Guild));
        assert!(policy.includes(EntityType::Channel));
        assert!(policy.includes(EntityType::Member));
        assert!(policy.includes(EntityType::Role));
        assert!(policy.includes(EntityType::User));
        assert!(!policy.includes(EntityType::Presence));
        assert!(!policy.includes(EntityType::Message));
        assert!(!policy.includes(EntityType::Emoji));
    }

    #[test]
    fn absent_type_is_excluded() {
        let policy = CachePolicy::none().with(EntityType::Guild, true);
        assert!(policy.includes(EntityType::Guild));
        assert!(!policy.includes(EntityType::Role));
    }

    #[test]
    fn unknown_names_are_ignored_when_parsing() {
        let parsed: Result<CachePolicy, _> =
            serde_json::from_str(r#"{"guilds": true, "persona": true, "roles": false}"#);
        let policy = parsed.ok();
        assert_eq!(
            policy,
            Some(
                CachePolicy::none()
                    .with(EntityType::Guild, true)
                    .with(EntityType::Role, false)
            )
        );
        assert!(policy.is_some_and(|p| !p.includes_name("persona")));
    }

    #[test]
    fn serializes_with_plural_names() {
        let policy = CachePolicy::none().with(EntityType::Member, true);
        let json = serde_json::to_string(&policy).ok();
        assert_eq!(json.as_deref(), Some(r#"{"members":true}"#));
    }
}
