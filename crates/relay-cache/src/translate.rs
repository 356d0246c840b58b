//! Event translator: one raw gateway event in, an ordered list of mutations out.
//!
//! Translation is pure except for `GUILD_MEMBER_UPDATE`, whose payload omits
//! the join date and voice flags. For that event the existing member entry is
//! read from the store and its `joined_at`/`deaf`/`mute` are carried over; if
//! the entry is absent or the read fails, placeholder values are used.
//!
//! # Event Mapping
//!
//! | Event | Mutations | Key |
//! |-------|-----------|-----|
//! | `CHANNEL_CREATE`, `CHANNEL_UPDATE` | upsert channel | `id` |
//! | `CHANNEL_DELETE` | delete channel | `id` |
//! | `GUILD_CREATE`, `GUILD_UPDATE` | upsert guild | `id` |
//! | `GUILD_DELETE` | delete guild | `id` |
//! | `GUILD_MEMBER_ADD` | upsert member | `{guild_id}_{user.id}` |
//! | `GUILD_MEMBER_REMOVE` | delete member | `{guild_id}_{user.id}` |
//! | `GUILD_MEMBER_UPDATE` | upsert member (merged) | `{guild_id}_{user.id}` |
//! | `GUILD_MEMBERS_CHUNK` | upsert member per entry | `{guild_id}_{member id}` |
//! | `GUILD_ROLE_CREATE`, `GUILD_ROLE_UPDATE` | upsert role (+`guild_id`) | `role.id` |
//! | `GUILD_ROLE_DELETE` | delete role | `role_id` |
//! | `PRESENCE_UPDATE` | upsert presence (user reduced to id) | `{guild_id}_{user.id}` |
//! | `USER_UPDATE` | upsert user | `id` |
//!
//! Any other event type translates to no mutations.

use relay_types::{EntityType, Mutation, RawEvent};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::TranslateError;
use crate::store::CacheStore;

/// `joined_at` used when a member update arrives for an unknown member.
pub const EPOCH_JOINED_AT: &str = "1970-01-01T00:00:00.000000+00:00";

/// Composite key for guild-scoped user entities (members, presences).
pub fn member_key(guild_id: &str, user_id: &str) -> String {
    format!("{guild_id}_{user_id}")
}

/// Translate one event into the mutations it implies, in commit order.
///
/// # Errors
///
/// Returns [`TranslateError::MissingField`] if a recognized event lacks an
/// id the translator needs to build a key.
pub async fn translate<S>(event: RawEvent, store: &S) -> Result<Vec<Mutation>, TranslateError>
where
    S: CacheStore,
{
    let RawEvent { kind, data } = event;
    let ids = Ids { event: &kind };

    let mutations = match kind.as_str() {
        "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
            vec![Mutation::upsert(EntityType::Channel, ids.get(&data, &["id"])?, data)]
        }
        "CHANNEL_DELETE" => vec![Mutation::delete(EntityType::Channel, ids.get(&data, &["id"])?)],
        "GUILD_CREATE" | "GUILD_UPDATE" => {
            vec![Mutation::upsert(EntityType::Guild, ids.get(&data, &["id"])?, data)]
        }
        "GUILD_DELETE" => vec![Mutation::delete(EntityType::Guild, ids.get(&data, &["id"])?)],
        "GUILD_MEMBER_ADD" => {
            let key = ids.member(&data)?;
            vec![Mutation::upsert(EntityType::Member, key, data)]
        }
        "GUILD_MEMBER_REMOVE" => vec![Mutation::delete(EntityType::Member, ids.member(&data)?)],
        "GUILD_MEMBER_UPDATE" => vec![member_update(&ids, data, store).await?],
        "GUILD_MEMBERS_CHUNK" => members_chunk(&ids, data)?,
        "GUILD_ROLE_CREATE" | "GUILD_ROLE_UPDATE" => vec![role_upsert(&ids, data)?],
        "GUILD_ROLE_DELETE" => vec![Mutation::delete(EntityType::Role, ids.get(&data, &["role_id"])?)],
        "PRESENCE_UPDATE" => vec![presence_update(&ids, data)?],
        "USER_UPDATE" => vec![Mutation::upsert(EntityType::User, ids.get(&data, &["id"])?, data)],
        _ => Vec::new(),
    };
    Ok(mutations)
}

/// Id extraction scoped to one event, for error reporting.
struct Ids<'a> {
    event: &'a str,
}

impl Ids<'_> {
    /// Read the id at `path`. Strings must be non-empty; numbers are
    /// rendered in decimal.
    fn get(&self, data: &Value, path: &[&str]) -> Result<String, TranslateError> {
        let found = path.iter().try_fold(data, |value, field| value.get(field));
        match found {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(TranslateError::MissingField {
                event: self.event.to_owned(),
                field: path.join("."),
            }),
        }
    }

    /// `{guild_id}_{user.id}` from a member-shaped payload.
    fn member(&self, data: &Value) -> Result<String, TranslateError> {
        let guild_id = self.get(data, &["guild_id"])?;
        let user_id = self.get(data, &["user", "id"])?;
        Ok(member_key(&guild_id, &user_id))
    }
}

/// Merge a partial member update with whatever the store already knows.
async fn member_update<S>(ids: &Ids<'_>, data: Value, store: &S) -> Result<Mutation, TranslateError>
where
    S: CacheStore,
{
    let key = ids.member(&data)?;

    let existing = match store.get(EntityType::Member, &key).await {
        Ok(existing) => existing,
        Err(e) => {
            warn!(key = key, error = %e, "member lookup failed, using placeholder fields");
            None
        }
    };
    let carried = |field: &str, default: Value| {
        existing
            .as_ref()
            .and_then(|member| member.get(field))
            .cloned()
            .unwrap_or(default)
    };

    let value = json!({
        "guild_id": data.get("guild_id").cloned().unwrap_or(Value::Null),
        "user": data.get("user").cloned().unwrap_or(Value::Null),
        "roles": data.get("roles").cloned().unwrap_or_else(|| json!([])),
        "nick": data.get("nick").cloned().unwrap_or(Value::Null),
        "joined_at": carried("joined_at", json!(EPOCH_JOINED_AT)),
        "deaf": carried("deaf", json!(false)),
        "mute": carried("mute", json!(false)),
    });
    Ok(Mutation::upsert(EntityType::Member, key, value))
}

/// One upsert per member in the chunk. Members carry their id either at
/// `id` or at `user.id`.
fn members_chunk(ids: &Ids<'_>, mut data: Value) -> Result<Vec<Mutation>, TranslateError> {
    let guild_id = ids.get(&data, &["guild_id"])?;
    let members = match data.get_mut("members").map(Value::take) {
        Some(Value::Array(members)) => members,
        _ => {
            return Err(TranslateError::MissingField {
                event: ids.event.to_owned(),
                field: "members".to_owned(),
            });
        }
    };

    members
        .into_iter()
        .map(|member| -> Result<Mutation, TranslateError> {
            let member_id = ids
                .get(&member, &["id"])
                .or_else(|_| ids.get(&member, &["user", "id"]))?;
            Ok(Mutation::upsert(
                EntityType::Member,
                member_key(&guild_id, &member_id),
                member,
            ))
        })
        .collect()
}

/// Store the role document itself, stamped with its guild.
fn role_upsert(ids: &Ids<'_>, mut data: Value) -> Result<Mutation, TranslateError> {
    let guild_id = ids.get(&data, &["guild_id"])?;
    let role_id = ids.get(&data, &["role", "id"])?;
    let mut role = data.get_mut("role").map(Value::take).unwrap_or(Value::Null);
    if let Some(fields) = role.as_object_mut() {
        fields.insert("guild_id".to_owned(), Value::String(guild_id));
    }
    Ok(Mutation::upsert(EntityType::Role, role_id, role))
}

/// Presence with the user sub-document reduced to its id.
fn presence_update(ids: &Ids<'_>, mut data: Value) -> Result<Mutation, TranslateError> {
    let guild_id = ids.get(&data, &["guild_id"])?;
    let user_id = ids.get(&data, &["user", "id"])?;
    if let Some(fields) = data.as_object_mut() {
        fields.insert("user".to_owned(), json!({ "id": user_id }));
    }
    Ok(Mutation::upsert(
        EntityType::Presence,
        member_key(&guild_id, &user_id),
        data,
    ))
}
