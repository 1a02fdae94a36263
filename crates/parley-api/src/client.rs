//! HTTP implementation of the conversation store.
//!
//! [`ApiClient`] talks to the backend's REST API (`/api/chats`…) with
//! `reqwest`, attaching a hard per-attempt timeout to every request and
//! routing every call through [`execute_with_retry`]. The send-message call
//! uses a longer timeout because it waits on an upstream completion; the
//! reachability probe uses a short one and never retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use parley_core::retry::RetryConfig;
use parley_core::{
    Conversation, ConversationDetail, ConversationId, ErrorCode, SendMessageResponse,
};

use crate::connectivity::{AlwaysOnline, Connectivity};
use crate::error::ApiError;
use crate::http::execute_with_retry;
use crate::store::ConversationStore;

/// Default per-attempt timeout for ordinary calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Per-attempt timeout for the send-message call (waits on a completion).
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 45_000;
/// Timeout for the startup reachability probe.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for [`ApiClient`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash (e.g. `http://localhost:3000`).
    pub base_url: String,
    /// Per-attempt timeout for ordinary calls in ms (default: 30000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Per-attempt timeout for send-message in ms (default: 45000).
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Timeout for the reachability probe in ms (default: 5000).
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    /// Retry policy for retryable failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_send_timeout_ms() -> u64 {
    DEFAULT_SEND_TIMEOUT_MS
}
fn default_health_timeout_ms() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_MS
}

impl ApiConfig {
    /// Config with default timeouts and retry policy for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            health_timeout_ms: DEFAULT_HEALTH_TIMEOUT_MS,
            retry: RetryConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// `reqwest`-backed [`ConversationStore`] implementation.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    connectivity: Arc<dyn Connectivity>,
}

impl ApiClient {
    /// Create a client with the default connectivity probe (always online).
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self::with_connectivity(config, Arc::new(AlwaysOnline))
    }

    /// Create a client with a custom connectivity probe.
    #[must_use]
    pub fn with_connectivity(config: ApiConfig, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            connectivity,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// One attempt: send the request with its hard timeout, classify the
    /// outcome, decode a successful body.
    async fn attempt<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method, url).timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let online = self.connectivity.is_online();
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e, online))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(&e, online))?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            Err(ApiError::from_response(status.as_u16(), &bytes))
        }
    }

    /// Run an operation through the retry layer with the given timeout.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        timeout_ms: u64,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let timeout = Duration::from_millis(timeout_ms);
        execute_with_retry(
            |_| self.attempt(method.clone(), &url, body.as_ref(), timeout),
            &self.config.retry,
            None,
        )
        .await
    }
}

/// Body of a successful delete, discarded after decoding.
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[allow(dead_code)]
    message: String,
}

/// Body of a successful health probe.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[allow(dead_code)]
    status: String,
}

#[async_trait]
impl ConversationStore for ApiClient {
    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        self.request(Method::POST, "/api/chats", None, self.config.timeout_ms)
            .await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.request(Method::GET, "/api/chats", None, self.config.timeout_ms)
            .await
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<ConversationDetail, ApiError> {
        self.request(
            Method::GET,
            &format!("/api/chats/{id}"),
            None,
            self.config.timeout_ms,
        )
        .await
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError> {
        self.request(
            Method::POST,
            &format!("/api/chats/{id}/messages"),
            Some(json!({ "content": content })),
            self.config.send_timeout_ms,
        )
        .await
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<(), ApiError> {
        let result: Result<DeleteResponse, ApiError> = self
            .request(
                Method::DELETE,
                &format!("/api/chats/{id}"),
                None,
                self.config.timeout_ms,
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            // Already gone counts as deleted for cleanup purposes.
            Err(err) if err.code() == ErrorCode::NotFound => {
                debug!(conversation_id = %id, "delete target already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn check_reachability(&self) -> Result<(), ApiError> {
        let timeout = Duration::from_millis(self.config.health_timeout_ms);
        let url = self.url("/health");
        let _: HealthResponse = self.attempt(Method::GET, &url, None, timeout).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
