//! The conversation state machine.
//!
//! [`ChatController`] owns all conversational state behind a mutex and
//! exposes commands as async methods on `&self`, so hosts can share it via
//! `Arc` across tasks. The lock is only ever held between suspension points,
//! never across an await; every continuation re-validates that it is still
//! relevant before applying its result:
//!
//! - message loads capture a `load_epoch` generation and are discarded if a
//!   newer navigation bumped it first;
//! - sends and edits re-check that their conversation is still selected;
//! - everything checks the teardown [`CancellationToken`] after resuming.
//!
//! Send lifecycle per conversation: `idle → pending → persisted | failed`.
//! From `failed` the only exits are a user-initiated retry or removal via a
//! later truncation. At most one send/edit is in flight at a time; commands
//! arriving while `loading` is true are ignored.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use parley_api::{ApiError, ConversationStore};
use parley_core::{
    validate_content, Conversation, ConversationId, Message, MessageId, SendMessageResponse,
};

use crate::failed::FailedSend;
use crate::navigation::{NavCommand, Route};
use crate::state::{BackendStatus, ChatState, EditSession};

/// Which message a send outcome applies to.
enum SendTarget {
    /// Fresh send: an optimistic message with this temporary ID was appended.
    Fresh(MessageId),
    /// Retry: the failed message with this ID stays in place.
    Retry(MessageId),
}

impl SendTarget {
    fn message_id(&self) -> &MessageId {
        match self {
            Self::Fresh(id) | Self::Retry(id) => id,
        }
    }
}

/// Single owner of the conversation state, exposing commands and a
/// consistent read snapshot.
pub struct ChatController<S> {
    store: Arc<S>,
    state: Mutex<ChatState>,
    cancel: CancellationToken,
}

impl<S: ConversationStore> ChatController<S> {
    /// Create a controller over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Mutex::new(ChatState::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// A consistent clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.state.lock().clone()
    }

    /// Tear down: no continuation resumed after this call mutates state.
    ///
    /// The underlying network requests are not guaranteed to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    // ── Startup ────────────────────────────────────────────────────────

    /// Probe the backend, load the conversation list, and resolve a
    /// deep-linked route.
    ///
    /// Returns [`NavCommand::Home`] when the deep link names an unknown
    /// conversation.
    #[instrument(skip(self, initial))]
    pub async fn initialize(&self, initial: Route) -> Option<NavCommand> {
        {
            let mut s = self.state.lock();
            s.backend_status = BackendStatus::Checking;
            s.conversations_loading = true;
        }
        let nav = self.run_initial_load(initial).await;
        if !self.cancel.is_cancelled() {
            self.state.lock().conversations_loading = false;
        }
        nav
    }

    async fn run_initial_load(&self, initial: Route) -> Option<NavCommand> {
        if let Err(err) = self.store.check_reachability().await {
            if self.cancel.is_cancelled() {
                return None;
            }
            warn!(code = %err.code(), "backend unreachable at startup");
            let mut s = self.state.lock();
            s.backend_status = BackendStatus::Offline;
            s.error = Some(err.to_string());
            return None;
        }
        if self.cancel.is_cancelled() {
            return None;
        }
        self.state.lock().backend_status = BackendStatus::Online;

        let conversations = match self.store.list_conversations().await {
            Ok(list) => list,
            Err(err) => {
                if self.cancel.is_cancelled() {
                    return None;
                }
                warn!(code = %err.code(), "conversation list load failed at startup");
                let mut s = self.state.lock();
                s.backend_status = BackendStatus::Offline;
                s.error = Some(err.to_string());
                return None;
            }
        };
        if self.cancel.is_cancelled() {
            return None;
        }

        let deep_link = {
            let mut s = self.state.lock();
            s.conversations = conversations;
            match initial {
                Some(id) => match s.conversations.iter().find(|c| c.id == id).cloned() {
                    Some(conversation) => {
                        s.selected = Some(conversation.clone());
                        s.messages_loaded = false;
                        Some(conversation)
                    }
                    None => {
                        debug!(conversation_id = %id, "deep link names unknown conversation");
                        return Some(NavCommand::Home);
                    }
                },
                None => {
                    s.selected = None;
                    s.messages.clear();
                    s.messages_loaded = true;
                    None
                }
            }
        };

        if let Some(conversation) = deep_link {
            match self.store.get_conversation(&conversation.id).await {
                Ok(detail) => {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let mut s = self.state.lock();
                    s.messages = detail.messages;
                    s.messages_loaded = true;
                }
                Err(err) => {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    warn!(code = %err.code(), "deep-linked message load failed");
                    let mut s = self.state.lock();
                    s.backend_status = BackendStatus::Offline;
                    s.error = Some(err.to_string());
                }
            }
        }
        None
    }

    // ── Navigation reconciliation ──────────────────────────────────────

    /// Reconcile an externally changed route with the current selection.
    ///
    /// Called by the [`NavigationSynchronizer`](crate::navigation::NavigationSynchronizer)
    /// for both user-initiated and browser-driven route changes. No-op while
    /// the initial load is outstanding.
    pub async fn sync_route(&self, route: Route) -> Option<NavCommand> {
        let (target, epoch) = {
            let mut s = self.state.lock();
            if s.conversations_loading {
                return None;
            }
            match route {
                Some(id) => {
                    let Some(conversation) =
                        s.conversations.iter().find(|c| c.id == id).cloned()
                    else {
                        debug!(conversation_id = %id, "route names unknown conversation");
                        return Some(NavCommand::Home);
                    };
                    if s.is_selected(&conversation.id) {
                        return None;
                    }
                    s.messages.clear();
                    s.messages_loaded = false;
                    s.selected = Some(conversation.clone());
                    s.load_epoch += 1;
                    (conversation, s.load_epoch)
                }
                None => {
                    if s.selected.is_some() {
                        s.selected = None;
                        s.messages.clear();
                        s.messages_loaded = true;
                    }
                    return None;
                }
            }
        };

        let result = self.store.get_conversation(&target.id).await;

        let mut s = self.state.lock();
        if self.cancel.is_cancelled() || s.load_epoch != epoch {
            debug!(conversation_id = %target.id, "discarding stale message load");
            return None;
        }
        match result {
            Ok(detail) => {
                s.messages = detail.messages;
                s.messages_loaded = true;
            }
            Err(err) => {
                debug!(code = %err.code(), conversation_id = %target.id, "message load failed");
                s.error = Some("Failed to load messages".to_owned());
            }
        }
        None
    }

    // ── Conversation lifecycle ─────────────────────────────────────────

    /// Create a new conversation, select it, and request navigation to it.
    ///
    /// The conversation being left is deleted first when it never received a
    /// message; that cleanup is best-effort and never surfaces errors.
    #[instrument(skip(self))]
    pub async fn start_new_conversation(&self) -> Option<NavCommand> {
        let previous = {
            let mut s = self.state.lock();
            s.error = None;
            s.selected.clone()
        };
        if let Some(conversation) = previous {
            self.delete_if_empty(&conversation).await;
        }
        if self.cancel.is_cancelled() {
            return None;
        }

        match self.store.create_conversation().await {
            Ok(conversation) => {
                if self.cancel.is_cancelled() {
                    return None;
                }
                debug!(conversation_id = %conversation.id, "conversation created");
                let mut s = self.state.lock();
                s.conversations.insert(0, conversation.clone());
                s.selected = Some(conversation.clone());
                s.messages.clear();
                // A freshly created conversation is known empty; no fetch
                // is needed before cleanup can trust the sequence.
                s.messages_loaded = true;
                s.failed.clear();
                Some(NavCommand::Conversation(conversation.id))
            }
            Err(err) => {
                if self.cancel.is_cancelled() {
                    return None;
                }
                warn!(code = %err.code(), "conversation create failed");
                self.state.lock().error = Some("Failed to create conversation".to_owned());
                None
            }
        }
    }

    /// Request navigation to another conversation.
    ///
    /// Message loading happens when the route change is synchronized back,
    /// so user selection and browser navigation share that code path. The
    /// conversation being left gets the same empty-conversation cleanup as
    /// [`start_new_conversation`](Self::start_new_conversation).
    #[instrument(skip(self), fields(conversation_id = %id))]
    pub async fn select_conversation(&self, id: ConversationId) -> Option<NavCommand> {
        let previous = {
            let s = self.state.lock();
            s.selected.as_ref().filter(|c| c.id != id).cloned()
        };
        if let Some(conversation) = previous {
            self.delete_if_empty(&conversation).await;
        }
        Some(NavCommand::Conversation(id))
    }

    /// Delete a conversation and drop it from the list.
    ///
    /// When the deleted conversation was selected, clears the selection and
    /// requests navigation home.
    #[instrument(skip(self), fields(conversation_id = %id))]
    pub async fn delete_conversation(&self, id: &ConversationId) -> Option<NavCommand> {
        {
            self.state.lock().error = None;
        }
        match self.store.delete_conversation(id).await {
            Ok(()) => {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let mut s = self.state.lock();
                s.conversations.retain(|c| &c.id != id);
                if s.is_selected(id) {
                    s.selected = None;
                    s.messages.clear();
                    s.messages_loaded = true;
                    return Some(NavCommand::Home);
                }
                None
            }
            Err(err) => {
                if self.cancel.is_cancelled() {
                    return None;
                }
                warn!(code = %err.code(), "conversation delete failed");
                self.state.lock().error = Some("Failed to delete conversation".to_owned());
                None
            }
        }
    }

    /// Delete `conversation` if it has no messages. Best-effort: a failed
    /// message fetch reads as non-empty, and delete failures are swallowed.
    ///
    /// The in-memory sequence is trusted only when it actually reflects
    /// server state (`messages_loaded`); after a failed load the
    /// conversation is re-fetched rather than assumed empty.
    async fn delete_if_empty(&self, conversation: &Conversation) {
        let in_memory = {
            let s = self.state.lock();
            (s.is_selected(&conversation.id) && s.messages_loaded)
                .then(|| s.messages.is_empty())
        };
        let empty = match in_memory {
            Some(empty) => empty,
            None => match self.store.get_conversation(&conversation.id).await {
                Ok(detail) => detail.messages.is_empty(),
                Err(err) => {
                    debug!(
                        conversation_id = %conversation.id,
                        code = %err.code(),
                        "cleanup fetch failed; keeping conversation"
                    );
                    false
                }
            },
        };
        if !empty {
            return;
        }

        match self.store.delete_conversation(&conversation.id).await {
            Ok(()) => {
                debug!(conversation_id = %conversation.id, "empty conversation cleaned up");
                let mut s = self.state.lock();
                s.conversations.retain(|c| c.id != conversation.id);
            }
            Err(err) => {
                debug!(
                    conversation_id = %conversation.id,
                    code = %err.code(),
                    "cleanup delete failed"
                );
            }
        }
    }

    // ── Sending ────────────────────────────────────────────────────────

    /// Send a message in the selected conversation.
    ///
    /// A fresh send (`retry_target` is `None`) appends an optimistic user
    /// message with a temporary ID; a retry reuses the failed message in
    /// place. No-op without a selection, while another send is outstanding,
    /// or when the content fails validation.
    #[instrument(skip(self, content), fields(retry = retry_target.is_some()))]
    pub async fn send_message(&self, content: &str, retry_target: Option<MessageId>) {
        let Some((conversation_id, content, target)) = self.begin_send(content, retry_target)
        else {
            return;
        };
        let result = self.store.append_message(&conversation_id, &content).await;
        self.finish_send(&conversation_id, &target, result);
    }

    /// Retry a failed user message with its original content.
    ///
    /// No-op when the ID names no message or a non-user message.
    pub async fn retry_message(&self, id: &MessageId) {
        let content = {
            let s = self.state.lock();
            match s.messages.iter().find(|m| &m.id == id) {
                Some(message) if message.is_user() => message.content.clone(),
                _ => return,
            }
        };
        self.send_message(&content, Some(id.clone())).await;
    }

    fn begin_send(
        &self,
        content: &str,
        retry_target: Option<MessageId>,
    ) -> Option<(ConversationId, String, SendTarget)> {
        let mut s = self.state.lock();
        let selected = s.selected.clone()?;
        if s.loading {
            debug!("send ignored; another send is outstanding");
            return None;
        }
        let content = match validate_content(content) {
            Ok(trimmed) => trimmed.to_owned(),
            Err(err) => {
                s.error = Some(err.to_string());
                return None;
            }
        };
        s.error = None;

        let target = match retry_target {
            Some(id) => SendTarget::Retry(id),
            None => {
                let pending = Message::pending_user(content.clone());
                let id = pending.id.clone();
                s.messages.push(pending);
                SendTarget::Fresh(id)
            }
        };
        s.loading = true;
        Some((selected.id, content, target))
    }

    fn finish_send(
        &self,
        conversation_id: &ConversationId,
        target: &SendTarget,
        result: Result<SendMessageResponse, ApiError>,
    ) {
        let mut s = self.state.lock();
        if self.cancel.is_cancelled() {
            s.loading = false;
            return;
        }
        if !s.is_selected(conversation_id) {
            debug!(conversation_id = %conversation_id, "discarding send result; selection moved");
            s.loading = false;
            return;
        }

        match result {
            Ok(response) => {
                match target {
                    SendTarget::Retry(id) => {
                        // The retried message and anything after it (e.g. a
                        // reply tied to a superseded attempt) are replaced by
                        // the persisted pair.
                        if let Some(index) = s.messages.iter().position(|m| &m.id == id) {
                            s.messages.truncate(index);
                        }
                        s.messages.push(response.user_message);
                        s.messages.push(response.assistant_message);
                        let _ = s.failed.remove(id);
                    }
                    SendTarget::Fresh(temp_id) => {
                        s.messages.retain(|m| &m.id != temp_id);
                        s.messages.push(response.user_message);
                        s.messages.push(response.assistant_message);
                    }
                }
                if let Some(title) = response.updated_title {
                    Self::apply_title(&mut s, conversation_id, title);
                }
            }
            Err(err) => {
                let message = err.to_string();
                let code = err.code();
                debug!(code = %code, "send failed");
                s.failed.insert(
                    target.message_id().clone(),
                    FailedSend {
                        message: message.clone(),
                        code,
                    },
                );
                s.error = Some(message);
            }
        }
        s.loading = false;
    }

    /// Apply a server-issued title to the selection and the list entry.
    fn apply_title(s: &mut ChatState, conversation_id: &ConversationId, title: String) {
        if let Some(selected) = s.selected.as_mut() {
            selected.title.clone_from(&title);
        }
        if let Some(entry) = s.conversations.iter_mut().find(|c| &c.id == conversation_id) {
            entry.title = title;
        }
    }

    // ── Editing ────────────────────────────────────────────────────────

    /// Enter edit mode for a user message.
    ///
    /// Refused for failed messages (retry is the recovery path there) and
    /// for assistant messages. Returns whether edit mode was entered.
    pub fn start_editing(&self, id: &MessageId) -> bool {
        let mut s = self.state.lock();
        if s.failed.contains(id) {
            debug!(message_id = %id, "edit refused for failed message");
            return false;
        }
        let Some(message) = s.messages.iter().find(|m| &m.id == id) else {
            return false;
        };
        if !message.is_user() {
            return false;
        }
        s.editing = Some(EditSession {
            message_id: message.id.clone(),
            original_content: message.content.clone(),
        });
        true
    }

    /// Leave edit mode without submitting.
    pub fn cancel_editing(&self) {
        self.state.lock().editing = None;
    }

    /// Submit an edit: drop the edited message and everything after it, then
    /// send the new content as a fresh message.
    ///
    /// Errors surface via the global error, not the failed-message map; an
    /// edit is not individually retryable in place.
    #[instrument(skip(self, new_content), fields(message_id = %id))]
    pub async fn submit_edit(&self, id: &MessageId, new_content: &str) {
        let Some((conversation_id, content)) = self.begin_edit(id, new_content) else {
            return;
        };
        let result = self.store.append_message(&conversation_id, &content).await;
        self.finish_edit(&conversation_id, result);
    }

    fn begin_edit(&self, id: &MessageId, new_content: &str) -> Option<(ConversationId, String)> {
        let mut s = self.state.lock();
        let selected = s.selected.clone()?;
        if s.loading {
            debug!("edit ignored; another send is outstanding");
            return None;
        }
        let content = match validate_content(new_content) {
            Ok(trimmed) => trimmed.to_owned(),
            Err(err) => {
                s.error = Some(err.to_string());
                return None;
            }
        };
        let index = s.messages.iter().position(|m| &m.id == id)?;

        s.error = None;
        s.editing = None;
        s.messages.truncate(index);
        s.loading = true;
        Some((selected.id, content))
    }

    fn finish_edit(
        &self,
        conversation_id: &ConversationId,
        result: Result<SendMessageResponse, ApiError>,
    ) {
        let mut s = self.state.lock();
        if self.cancel.is_cancelled() {
            s.loading = false;
            return;
        }
        if !s.is_selected(conversation_id) {
            debug!(conversation_id = %conversation_id, "discarding edit result; selection moved");
            s.loading = false;
            return;
        }

        match result {
            Ok(response) => {
                s.messages.push(response.user_message);
                s.messages.push(response.assistant_message);
                if let Some(title) = response.updated_title {
                    Self::apply_title(&mut s, conversation_id, title);
                }
            }
            Err(err) => {
                debug!(code = %err.code(), "edit send failed");
                s.error = Some(err.to_string());
            }
        }
        s.loading = false;
    }
}
