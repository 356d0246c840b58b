//! Handle identifiers for the dispatch and cache plumbing.
//!
//! Subscriptions and dispatchers are addressed by explicit ids rather than
//! by reference identity, so a caller can hold on to the handle returned by
//! `attach` and later detach exactly that subscription.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a `UUIDv7` newtype handle with the standard derives.
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(#[ts(as = "String")] pub Uuid);

        impl $name {
            /// Allocate a fresh, time-ordered handle.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_handle! {
    /// Identifies one dispatcher instance.
    DispatcherId
}

define_handle! {
    /// Identifies one `attach` call on a cache connector.
    SubscriptionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let a = SubscriptionId::new();
        let b = SubscriptionId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn handle_display_matches_uuid() {
        let id = DispatcherId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
