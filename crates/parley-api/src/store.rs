//! The conversation store contract.
//!
//! [`ConversationStore`] captures exactly what the state machine relies on
//! from the backend. Every operation either succeeds or raises a classified
//! [`ApiError`]; none of them mutate caller-visible state. The production
//! implementation is [`ApiClient`](crate::client::ApiClient); tests
//! substitute scriptable fakes.

use async_trait::async_trait;

use parley_core::{Conversation, ConversationDetail, ConversationId, SendMessageResponse};

use crate::error::ApiError;

/// Store operations consumed by the conversation state machine.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new conversation with the sentinel title.
    async fn create_conversation(&self) -> Result<Conversation, ApiError>;

    /// List all conversations, newest first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Fetch a conversation and its messages (oldest first).
    ///
    /// Raises `NOT_FOUND` for unknown ids.
    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<ConversationDetail, ApiError>;

    /// Append a user message and wait for the assistant reply.
    ///
    /// Raises `NOT_FOUND` for unknown conversations, `INVALID_INPUT` for
    /// empty/blank or overlong content, or a provider-classified failure
    /// when the upstream completion fails, in which case the user message
    /// is already durably persisted and is attached to the error
    /// ([`ApiError::user_message`]).
    async fn append_message(
        &self,
        id: &ConversationId,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError>;

    /// Delete a conversation and its messages.
    ///
    /// Idempotent from the caller's perspective: deleting an already-gone
    /// conversation succeeds.
    async fn delete_conversation(&self, id: &ConversationId) -> Result<(), ApiError>;

    /// Probe backend reachability with a short timeout and no retries.
    ///
    /// Used once at startup to decide the online/offline banner state.
    async fn check_reachability(&self) -> Result<(), ApiError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
