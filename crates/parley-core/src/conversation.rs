//! Conversation and message wire types.
//!
//! These mirror the backend API's JSON shapes exactly (camelCase field
//! names). A [`Conversation`] is created server-side with the `"New Chat"`
//! sentinel title, which the server rewrites exactly once (on the first
//! user message) to a 40-character prefix of that message. Messages are
//! immutable once persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, MessageId};

/// Sentinel title of a conversation that has not received its first message.
pub const NEW_CONVERSATION_TITLE: &str = "New Chat";

/// Maximum message content length accepted by the store, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// A named, ordered thread of messages between a user and an assistant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Opaque identifier, issued by the store.
    pub id: ConversationId,
    /// Display title. Starts as [`NEW_CONVERSATION_TITLE`], rewritten once.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The assistant backend.
    Assistant,
}

/// A single message within a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque identifier. Temporary-namespace IDs mark optimistic local
    /// messages that the server has not confirmed yet.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a user message with a fresh server-style ID, stamped now.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Build an assistant message with a fresh server-style ID, stamped now.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Build an optimistic user message with a temporary-namespace ID.
    #[must_use]
    pub fn pending_user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_temp(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether this message was authored by the user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Response of the conversation-detail fetch: the conversation record plus
/// its messages, oldest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// The conversation record (`"chat"` on the wire).
    #[serde(rename = "chat")]
    pub conversation: Conversation,
    /// Messages, ordered oldest first.
    pub messages: Vec<Message>,
}

/// Response of a successful message append: the persisted user message, the
/// assistant reply, and the conversation title if this send set it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// The user message as persisted (server-issued ID and timestamp).
    pub user_message: Message,
    /// The generated assistant reply.
    pub assistant_message: Message,
    /// New conversation title, present when this was the first message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_title: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Content validation
// ─────────────────────────────────────────────────────────────────────────────

/// Rejection reasons for outgoing message content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// Content is empty or whitespace-only after trimming.
    #[error("Message cannot be empty")]
    Empty,
    /// Content exceeds [`MAX_MESSAGE_CHARS`] after trimming.
    #[error("Message too long")]
    TooLong,
}

/// Validate and normalize outgoing content before dispatch.
///
/// Returns the trimmed content. The store enforces the same rules
/// server-side (`INVALID_INPUT`); checking here avoids the round trip.
pub fn validate_content(content: &str) -> Result<&str, ContentError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Empty);
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ContentError::TooLong);
    }
    Ok(trimmed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
