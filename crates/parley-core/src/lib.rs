//! # parley-core
//!
//! Foundation types shared by every Parley crate:
//!
//! - **Branded IDs**: [`ConversationId`] and [`MessageId`] newtypes, with a
//!   reserved temporary namespace for optimistic local messages
//! - **Wire types**: [`Conversation`], [`Message`], and the store response
//!   shapes the backend API exchanges
//! - **Errors**: the [`ErrorCode`] taxonomy and the `{error, code}` payload
//!   shape every store operation surfaces
//! - **Retry**: [`RetryConfig`] and the pure exponential backoff calculation
//!
//! [`ConversationId`]: ids::ConversationId
//! [`MessageId`]: ids::MessageId
//! [`Conversation`]: conversation::Conversation
//! [`Message`]: conversation::Message
//! [`ErrorCode`]: errors::ErrorCode
//! [`RetryConfig`]: retry::RetryConfig

#![deny(unsafe_code)]

pub mod conversation;
pub mod errors;
pub mod ids;
pub mod retry;

pub use conversation::{
    Conversation, ConversationDetail, ContentError, Message, Role, SendMessageResponse,
    validate_content, MAX_MESSAGE_CHARS, NEW_CONVERSATION_TITLE,
};
pub use errors::{ErrorBody, ErrorCode};
pub use ids::{ConversationId, MessageId};
pub use retry::{backoff_delay, RetryConfig};
