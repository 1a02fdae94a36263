//! Retry configuration and backoff calculation.
//!
//! The portable, sync-only building blocks for retry logic: [`RetryConfig`]
//! and the pure [`backoff_delay`] calculation. The async retry execution
//! lives in `parley-api` (which has access to tokio and the HTTP client).
//!
//! Backoff is plain exponential doubling with no jitter: with the default
//! 1000 ms initial delay, waits between attempts are exactly 1 s, 2 s, 4 s.

use serde::{Deserialize, Serialize};

/// Default maximum retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Configuration for retry logic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in ms, doubled each attempt
    /// (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

/// Exponential backoff delay before retrying attempt `attempt` (0-indexed).
///
/// Formula: `initial_delay_ms × 2^attempt`, saturating on overflow.
#[must_use]
pub fn backoff_delay(attempt: u32, initial_delay_ms: u64) -> u64 {
    initial_delay_ms.saturating_mul(1u64 << attempt.min(63))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
