//! # parley-api
//!
//! Conversation store access and the resilient request layer beneath it.
//!
//! - [`ConversationStore`]: the exact contract the state machine relies on
//!   (create, list, fetch, append, delete, and a startup reachability probe)
//! - [`ApiClient`]: the `reqwest`-backed implementation against the backend
//!   HTTP API, wrapping every call in per-attempt timeout, exponential
//!   backoff retry, and error classification
//! - [`ApiError`]: classified failures (`TIMEOUT`, `OFFLINE`,
//!   `NETWORK_ERROR`, `HTTP_ERROR`, or a parsed `{error, code}` body)
//! - [`Connectivity`]: the seam standing in for a platform online/offline
//!   signal
//!
//! The layer is purely functional given its inputs: callers own all state
//! mutation.

#![deny(unsafe_code)]

pub mod client;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod store;

pub use client::{ApiClient, ApiConfig};
pub use connectivity::{AlwaysOnline, Connectivity};
pub use error::ApiError;
pub use http::execute_with_retry;
pub use store::ConversationStore;
