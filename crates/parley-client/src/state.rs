//! Conversation state snapshot types.
//!
//! [`ChatState`] is the full read model the controller exposes: hosts call
//! [`ChatController::snapshot`](crate::controller::ChatController::snapshot)
//! and render from the clone. All mutation goes through controller commands.

use parley_core::{Conversation, Message, MessageId};

use crate::failed::FailedSends;

/// Backend reachability, decided once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendStatus {
    /// The startup probe has not completed yet.
    Checking,
    /// The backend answered the reachability probe.
    Online,
    /// The backend is unreachable; commands will keep failing.
    Offline,
}

/// The message currently being edited.
///
/// At most one exists at a time; cleared on submit, cancel, or completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    /// ID of the message being edited.
    pub message_id: MessageId,
    /// Content as it was when editing started.
    pub original_content: String,
}

/// Full state snapshot of the conversation state machine.
#[derive(Clone, Debug)]
pub struct ChatState {
    /// All known conversations, newest first.
    pub conversations: Vec<Conversation>,
    /// True while the startup load (probe + list + deep-link fetch) runs.
    pub conversations_loading: bool,
    /// The selected conversation, if any.
    pub selected: Option<Conversation>,
    /// Message sequence of the selected conversation, oldest first, plus at
    /// most one trailing optimistic user message.
    pub messages: Vec<Message>,
    /// True exactly while a send or edit is outstanding.
    pub loading: bool,
    /// Last global error, shown as a banner.
    pub error: Option<String>,
    /// Backend reachability.
    pub backend_status: BackendStatus,
    /// Messages whose latest send attempt failed.
    pub failed: FailedSends,
    /// Active edit session, if any.
    pub editing: Option<EditSession>,
    /// Generation counter for message loads; a fetch result is applied only
    /// if the epoch it captured is still current.
    pub(crate) load_epoch: u64,
    /// Whether `messages` reflects server state for the selection. False
    /// after a cleared-but-not-yet-loaded navigation or a failed fetch, so
    /// an empty sequence is not mistaken for an empty conversation.
    pub(crate) messages_loaded: bool,
}

impl ChatState {
    pub(crate) fn new() -> Self {
        Self {
            conversations: Vec::new(),
            conversations_loading: true,
            selected: None,
            messages: Vec::new(),
            loading: false,
            error: None,
            backend_status: BackendStatus::Checking,
            failed: FailedSends::new(),
            editing: None,
            load_epoch: 0,
            messages_loaded: true,
        }
    }

    /// Whether the given conversation is the selected one.
    #[must_use]
    pub fn is_selected(&self, id: &parley_core::ConversationId) -> bool {
        self.selected.as_ref().is_some_and(|c| &c.id == id)
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
