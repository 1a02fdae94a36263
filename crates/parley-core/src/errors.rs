//! Classified error codes and the wire error payload.
//!
//! Every store operation surfaces failures as an `{error, code}` pair: a
//! human-readable message plus a symbolic code from a fixed taxonomy. The
//! codes drive two decisions downstream: whether the resilient request
//! client may retry, and whether the state machine records the failure
//! against a specific message or the global error banner.

use serde::{Deserialize, Serialize};

use crate::conversation::Message;

// ─────────────────────────────────────────────────────────────────────────────
// Error codes
// ─────────────────────────────────────────────────────────────────────────────

/// Symbolic error code carried by every classified failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The attempt exceeded its hard per-attempt timeout.
    Timeout,
    /// No network connectivity detected locally.
    Offline,
    /// Connection-level failure (DNS, refused, reset).
    NetworkError,
    /// Non-2xx response with an unparsable body.
    HttpError,
    /// The referenced conversation does not exist.
    NotFound,
    /// Content rejected by validation (empty/blank or over the length limit).
    InvalidInput,
    /// The upstream completion failed after the user message persisted.
    AiError,
    /// The AI provider returned a non-success response.
    AiProviderError,
    /// Rate limit exceeded.
    RateLimit,
    /// Anything the taxonomy does not recognize.
    #[serde(other)]
    UnknownError,
}

impl ErrorCode {
    /// Whether a failure with this code may be retried automatically.
    ///
    /// Only transient transport-level conditions qualify; validation and
    /// not-found failures never do.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Offline | Self::NetworkError | Self::RateLimit
        )
    }

    /// The wire representation of this code (e.g. `"NETWORK_ERROR"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Offline => "OFFLINE",
            Self::NetworkError => "NETWORK_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::AiError => "AI_ERROR",
            Self::AiProviderError => "AI_PROVIDER_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire payload
// ─────────────────────────────────────────────────────────────────────────────

/// Error payload shape returned by the backend on any failed operation.
///
/// When an upstream completion fails after the user message was already
/// persisted, the backend attaches that message so the caller can observe
/// the "user message persisted, assistant message absent" partial state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable description.
    pub error: String,
    /// Symbolic code.
    pub code: ErrorCode,
    /// The persisted user message, present only on partial send failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<Message>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
