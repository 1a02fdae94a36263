//! Classified API failures.
//!
//! Every failure mode of a store call is normalized into [`ApiError`]:
//! transport failures become `Timeout`/`Offline`/`Network` depending on the
//! failure kind and the local connectivity probe; non-2xx responses become
//! `Api` when the body parses as the backend's `{error, code}` shape and
//! `Http` otherwise. Retryability follows the classification: transient
//! transport failures, 429, and 5xx, never other 4xx.

use parley_core::{ErrorBody, ErrorCode, Message};

/// A classified failure from a store operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The attempt exceeded its hard per-attempt timeout.
    #[error("Request timed out. Please check your connection and try again.")]
    Timeout,

    /// No network connectivity detected locally.
    #[error("No internet connection. Please check your network.")]
    Offline,

    /// Connection-level failure (DNS, refused, reset).
    #[error("Unable to connect to the server. Please try again later.")]
    Network(String),

    /// Non-2xx response with an unparsable body.
    #[error("Request failed with status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Body excerpt kept for diagnostics.
        body: String,
    },

    /// The backend returned a parsed `{error, code}` failure.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the error body.
        message: String,
        /// Symbolic code from the error body.
        code: ErrorCode,
        /// The persisted user message, on partial send failures.
        user_message: Option<Message>,
    },

    /// A 2xx response whose body failed to decode.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a transport-level failure.
    ///
    /// `online` comes from the local connectivity probe and decides between
    /// `OFFLINE` and `NETWORK_ERROR` for connection failures.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error, online: bool) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if !online {
            return Self::Offline;
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Network(err.to_string())
    }

    /// Classify a non-2xx response from its status and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => Self::Api {
                status,
                message: parsed.error,
                code: parsed.code,
                user_message: parsed.user_message,
            },
            Err(_) => Self::Http {
                status,
                body: String::from_utf8_lossy(body).chars().take(200).collect(),
            },
        }
    }

    /// Whether the resilient request client may retry this failure.
    ///
    /// Transient transport conditions always qualify; HTTP failures only for
    /// 429 and 5xx.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Offline | Self::Network(_) => true,
            Self::Http { status, .. } | Self::Api { status, .. } => {
                *status == 429 || *status >= 500
            }
            Self::Decode(_) => false,
        }
    }

    /// The symbolic code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout => ErrorCode::Timeout,
            Self::Offline => ErrorCode::Offline,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Http { .. } => ErrorCode::HttpError,
            Self::Api { code, .. } => *code,
            Self::Decode(_) => ErrorCode::UnknownError,
        }
    }

    /// The persisted user message attached to a partial send failure.
    #[must_use]
    pub fn user_message(&self) -> Option<&Message> {
        match self {
            Self::Api { user_message, .. } => user_message.as_ref(),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
