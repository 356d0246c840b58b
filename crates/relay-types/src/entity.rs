//! Entity types tracked by the cache.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of entity a cache entry describes.
///
/// The singular name ([`EntityType::as_str`]) is part of every physical
/// cache key. The plural name ([`EntityType::plural`]) is the key used in a
/// [`crate::CachePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EntityType {
    /// A text, voice, or category channel.
    Channel,
    /// A guild (server).
    Guild,
    /// A user's membership in one guild.
    Member,
    /// A guild role.
    Role,
    /// A user's presence within one guild.
    Presence,
    /// A user account.
    User,
    /// A channel message.
    Message,
    /// A custom guild emoji.
    Emoji,
}

impl EntityType {
    /// Every entity type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Channel,
        Self::Guild,
        Self::Member,
        Self::Role,
        Self::Presence,
        Self::User,
        Self::Message,
        Self::Emoji,
    ];

    /// Singular lowercase name, e.g. `guild`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Guild => "guild",
            Self::Member => "member",
            Self::Role => "role",
            Self::Presence => "presence",
            Self::User => "user",
            Self::Message => "message",
            Self::Emoji => "emoji",
        }
    }

    /// Plural lowercase name used for policy lookups, e.g. `guilds`.
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Guild => "guilds",
            Self::Member => "members",
            Self::Role => "roles",
            Self::Presence => "presences",
            Self::User => "users",
            Self::Message => "messages",
            Self::Emoji => "emojis",
        }
    }

    /// Resolve a plural policy name back to its entity type.
    pub fn from_plural(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.plural() == name)
    }
}

impl core::fmt::Display for EntityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_names_resolve_back() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_plural(t.plural()), Some(t));
        }
        assert_eq!(EntityType::from_plural("guild"), None);
        assert_eq!(EntityType::from_plural("voicestates"), None);
    }

    #[test]
    fn serializes_as_singular_name() {
        let json = serde_json::to_string(&EntityType::Presence).ok();
        assert_eq!(json.as_deref(), Some("\"presence\""));
    }
}
