//! Retry with exponential back-off and jitter for the Storefront API client.
//!
//! Transient errors (network failures, 429, 5xx) are retried; everything else
//! is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::StorefrontError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts and connection failures, [`StorefrontError::RateLimited`],
/// and [`StorefrontError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:** GraphQL errors, 4xx statuses, malformed bodies and
/// configuration errors. Retrying won't change their outcome.
pub(crate) fn is_retriable(err: &StorefrontError) -> bool {
    match err {
        StorefrontError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        StorefrontError::RateLimited { .. } => true,
        StorefrontError::UnexpectedStatus { status, .. } => *status >= 500,
        StorefrontError::Deserialize { .. }
        | StorefrontError::GraphQl(_)
        | StorefrontError::InvalidStoreDomain { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The n-th retry waits `backoff_base_ms * 2^(n-1)` ms ± 25 % jitter, capped
/// at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, StorefrontError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorefrontError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
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
                    "storefront API transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn graphql_error_is_not_retriable() {
        assert!(!is_retriable(&StorefrontError::GraphQl("bad id".to_owned())));
    }

    #[test]
    fn only_server_statuses_are_retriable() {
        let server = StorefrontError::UnexpectedStatus {
            status: 502,
            url: "https://shop.example.com".to_owned(),
        };
        let client = StorefrontError::UnexpectedStatus {
            status: 401,
            url: "https://shop.example.com".to_owned(),
        };
        assert!(is_retriable(&server));
        assert!(!is_retriable(&client));
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorefrontError::RateLimited {
                        retry_after_secs: 0,
                    })
                } else {
                    Ok::<u32, StorefrontError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(StorefrontError::UnexpectedStatus {
                    status: 503,
                    url: "https://shop.example.com".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(StorefrontError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_graphql_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(StorefrontError::GraphQl("invalid id".to_owned()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(StorefrontError::GraphQl(_))));
    }
}
