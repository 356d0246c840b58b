//! Shared type definitions for the Relay gateway cache.
//!
//! Every crate in the workspace speaks in these types: the transport hands
//! the dispatcher [`RawEvent`]s, the translator turns them into
//! [`Mutation`]s, and the connector filters those through a
//! [`CachePolicy`] before committing them to a store. Types with
//! `#[ts(export)]` also flow to `TypeScript` via `ts-rs` for bot code that
//! reads the cache directly.
//!
//! # Modules
//!
//! - [`entity`] -- Entity types and their singular/plural names
//! - [`event`] -- The raw event envelope
//! - [`mutation`] -- Normalized upsert/delete instructions
//! - [`policy`] -- Per-entity-type inclusion policy
//! - [`ids`] -- Dispatcher and subscription handles

pub mod entity;
pub mod event;
pub mod ids;
pub mod mutation;
pub mod policy;

pub use entity::EntityType;
pub use event::RawEvent;
pub use ids::{DispatcherId, SubscriptionId};
pub use mutation::Mutation;
pub use policy::CachePolicy;

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // Writes TypeScript bindings to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::EntityType::export_all();
        let _ = crate::RawEvent::export_all();
        let _ = crate::Mutation::export_all();
        let _ = crate::DispatcherId::export_all();
        let _ = crate::SubscriptionId::export_all();
    }
}
