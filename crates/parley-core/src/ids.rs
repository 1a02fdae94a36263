//! Branded ID newtypes for type safety.
//!
//! Conversations and messages carry distinct ID types implemented as newtype
//! wrappers around `String`, so a conversation ID can never be passed where a
//! message ID is expected.
//!
//! Server-issued IDs are UUIDs. Optimistic local messages use a reserved
//! `temp-user-` namespace that the server never issues, so replacing a
//! temporary message with its persisted counterpart can never collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix of the reserved temporary-ID namespace for optimistic messages.
pub const TEMP_ID_PREFIX: &str = "temp-user-";

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a conversation.
    ConversationId
}

branded_id! {
    /// Unique identifier for a message.
    ///
    /// Either server-issued (a plain UUID) or a local temporary ID created
    /// via [`MessageId::new_temp`] for an optimistic message that has not
    /// been persisted yet.
    MessageId
}

impl MessageId {
    /// Create a temporary ID for an optimistic local message.
    ///
    /// Temporary IDs live in the reserved `temp-user-` namespace; the server
    /// never issues IDs with this prefix.
    #[must_use]
    pub fn new_temp() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", new_v7()))
    }

    /// Whether this ID belongs to the temporary namespace.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
