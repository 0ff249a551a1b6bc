//! Retry with exponential back-off and jitter for embedding provider calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx). Application-level errors are
//! returned immediately since retrying cannot fix them.

use std::future::Future;
use std::time::Duration;

use crate::error::EmbedError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx responses: transient server/infrastructure errors.
///
/// **Not retriable (hard stop):**
/// - [`EmbedError::Api`] — the provider rejected the request; retrying won't fix it.
/// - [`EmbedError::Deserialize`] — malformed response; retrying won't fix it.
/// - [`EmbedError::DimensionMismatch`] — caller-side math error.
pub(crate) fn is_retriable(err: &EmbedError) -> bool {
    match err {
        EmbedError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EmbedError::Api(_)
        | EmbedError::Deserialize { .. }
        | EmbedError::DimensionMismatch { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Delay doubles each attempt from `backoff_base_ms`, with ±25 % jitter,
/// capped at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, EmbedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EmbedError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "embedding provider transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> EmbedError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        EmbedError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&EmbedError::Api("bad request".to_owned())));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn dimension_mismatch_is_not_retriable() {
        assert!(!is_retriable(&EmbedError::DimensionMismatch {
            left: 3,
            right: 4
        }));
    }

    #[tokio::test]
    async fn non_retriable_error_returns_after_first_attempt() {
        let mut calls = 0u32;
        let result: Result<(), EmbedError> = retry_with_backoff(3, 1, || {
            calls += 1;
            async { Err(EmbedError::Api("nope".to_owned())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn success_passes_through() {
        let result = retry_with_backoff(3, 1, || async { Ok(7u32) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
