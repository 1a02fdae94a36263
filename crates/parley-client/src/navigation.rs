//! Navigation synchronization.
//!
//! The host owns an externally visible route (a URL, a deep link, a CLI
//! argument); [`NavigationSynchronizer`] keeps that route and the
//! conversation state machine consistent. Controller commands that change
//! location return a [`NavCommand`] which the host applies here; externally
//! driven changes (back/forward, a pasted link) go through
//! [`NavigationSynchronizer::navigate`]. Both paths funnel into the same
//! route reconciliation on the controller, so message loading behaves
//! identically regardless of who initiated the change.

use parley_api::ConversationStore;
use parley_core::ConversationId;

use crate::controller::ChatController;

/// The externally visible location: a conversation, or home when `None`.
pub type Route = Option<ConversationId>;

/// A navigation request emitted by the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavCommand {
    /// Navigate to a conversation.
    Conversation(ConversationId),
    /// Navigate to the empty route.
    Home,
}

impl NavCommand {
    /// The route this command leads to.
    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Self::Conversation(id) => Some(id.clone()),
            Self::Home => None,
        }
    }
}

/// Reconciles route changes with the conversation state machine.
#[derive(Clone, Debug, Default)]
pub struct NavigationSynchronizer {
    route: Route,
}

impl NavigationSynchronizer {
    /// Create a synchronizer at the home route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current route.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Apply a controller-issued navigation command.
    ///
    /// Updates the route and reconciles. A follow-up command (e.g. the new
    /// route turned out to be unknown) is applied recursively until the
    /// route settles.
    pub async fn apply<S: ConversationStore>(
        &mut self,
        chat: &ChatController<S>,
        command: NavCommand,
    ) {
        let mut next = Some(command);
        while let Some(command) = next.take() {
            self.route = command.route();
            next = chat.sync_route(self.route.clone()).await;
        }
    }

    /// Handle an externally driven route change (deep link, back/forward).
    pub async fn navigate<S: ConversationStore>(
        &mut self,
        chat: &ChatController<S>,
        route: Route,
    ) {
        self.route = route.clone();
        if let Some(command) = chat.sync_route(route).await {
            self.apply(chat, command).await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
