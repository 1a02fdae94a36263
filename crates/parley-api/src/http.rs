//! Resilient request execution.
//!
//! [`execute_with_retry`] wraps a fallible request attempt with exponential
//! backoff retry. The operation owns its per-attempt timeout (the HTTP
//! client attaches one to every request); this layer decides whether a
//! classified failure is worth another attempt and how long to wait.
//!
//! Retries happen only for retryable classifications ([`ApiError::is_retryable`]):
//! transient transport failures, 429, and 5xx. Waits follow
//! `initial_delay × 2^attempt` and can be interrupted by a cancellation
//! token, in which case the last classified error surfaces immediately.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use parley_core::retry::{backoff_delay, RetryConfig};

use crate::error::ApiError;

/// Execute `op` with exponential-backoff retry.
///
/// `op` receives the zero-based attempt index and is called at most
/// `retry.max_retries + 1` times. The final error after exhausting retries
/// is the last classified failure.
pub async fn execute_with_retry<T, F, Fut>(
    op: F,
    retry: &RetryConfig,
    cancel: Option<&CancellationToken>,
) -> Result<T, ApiError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= retry.max_retries {
                    return Err(err);
                }
                if let Some(token) = cancel {
                    if token.is_cancelled() {
                        return Err(err);
                    }
                }

                let delay_ms = backoff_delay(attempt, retry.initial_delay_ms);
                debug!(
                    attempt = attempt + 1,
                    max_attempts = retry.max_retries + 1,
                    delay_ms,
                    code = %err.code(),
                    "request failed; retrying"
                );

                if let Some(token) = cancel {
                    tokio::select! {
                        () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                        () = token.cancelled() => return Err(err),
                    }
                } else {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }

                attempt += 1;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ApiError {
        ApiError::from_response(500, b"Internal Server Error")
    }

    fn bad_request() -> ApiError {
        ApiError::from_response(400, b"Bad Request")
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let result = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                }
            },
            &RetryConfig::default(),
            None,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let result = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(server_error())
                    } else {
                        Ok("ok")
                    }
                }
            },
            &RetryConfig::default(),
            None,
        )
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_delays_are_exact() {
        // maxRetries=3, initialDelay=1000ms: waits of 1s, 2s, 4s = 7s total.
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = execute_with_retry(
            |_| async { Err(server_error()) },
            &RetryConfig {
                max_retries: 3,
                initial_delay_ms: 1000,
            },
            None,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_aborts_with_zero_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    Err(bad_request())
                }
            },
            &RetryConfig::default(),
            None,
        )
        .await;

        assert_matches!(result, Err(ApiError::Http { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let result: Result<(), _> = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Timeout)
                }
            },
            &RetryConfig {
                max_retries: 2,
                initial_delay_ms: 10,
            },
            None,
        )
        .await;

        assert_matches!(result, Err(ApiError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let result = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::from_response(429, b"Too Many Requests"))
                    } else {
                        Ok(())
                    }
                }
            },
            &RetryConfig::default(),
            None,
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_retries_never_sleeps() {
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = execute_with_retry(
            |_| async { Err(ApiError::Timeout) },
            &RetryConfig::none(),
            None,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff_wait() {
        let token = CancellationToken::new();
        let cancel = token.clone();

        // Cancel while the first backoff sleep is pending.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let start = tokio::time::Instant::now();
        let result: Result<(), _> = execute_with_retry(
            |_| async { Err(server_error()) },
            &RetryConfig {
                max_retries: 3,
                initial_delay_ms: 60_000,
            },
            Some(&token),
        )
        .await;

        assert_matches!(result, Err(ApiError::Http { status: 500, .. }));
        assert!(start.elapsed() < Duration::from_millis(60_000));
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_retries() {
        let token = CancellationToken::new();
        token.cancel();

        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = calls.clone();
        let result: Result<(), _> = execute_with_retry(
            |_| {
                let calls = calls_op.clone();
                async move {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    Err(server_error())
                }
            },
            &RetryConfig::default(),
            Some(&token),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_index_is_passed_through() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_op = seen.clone();
        let _ = execute_with_retry(
            |attempt| {
                let seen = seen_op.clone();
                async move {
                    seen.lock().unwrap().push(attempt);
                    Err::<(), _>(server_error())
                }
            },
            &RetryConfig {
                max_retries: 2,
                initial_delay_ms: 1,
            },
            None,
        )
        .await;

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }
}
