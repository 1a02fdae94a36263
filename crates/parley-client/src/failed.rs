//! Failed-send tracking.
//!
//! [`FailedSends`] maps a message ID (temporary or server-issued) to the
//! classified error of its most recent send attempt. An ID is present iff
//! that attempt did not produce a persisted assistant reply; a successful
//! retry removes the entry, and truncation (edit) drops the message along
//! with its record.

use std::collections::HashMap;

use parley_core::{ErrorCode, MessageId};

/// Error recorded against a message whose send failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedSend {
    /// Human-readable description shown next to the message.
    pub message: String,
    /// Symbolic code of the failure.
    pub code: ErrorCode,
}

/// Mapping from message IDs to their failed-send records.
#[derive(Clone, Debug, Default)]
pub struct FailedSends {
    inner: HashMap<MessageId, FailedSend>,
}

impl FailedSends {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure against a message, replacing any previous record.
    pub fn insert(&mut self, id: MessageId, failure: FailedSend) {
        let _ = self.inner.insert(id, failure);
    }

    /// Remove a message's record. Returns it if one existed.
    pub fn remove(&mut self, id: &MessageId) -> Option<FailedSend> {
        self.inner.remove(id)
    }

    /// Look up the record for a message.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&FailedSend> {
        self.inner.get(id)
    }

    /// Whether a message has a failed-send record.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.inner.contains_key(id)
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no failures are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
