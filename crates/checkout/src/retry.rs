//! Bounded retry with exponential backoff for transient storage failures.

use std::future::Future;
use std::time::Duration;

use store::StoreError;
use tokio::time::sleep;

/// Retry policy for the checkout commit.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Runs an operation, retrying only on transient storage errors.
///
/// Business failures such as `InsufficientStock` are returned immediately;
/// a retry would re-read the same authoritative state and is pointless.
pub async fn retry_transient<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "transient storage error, retrying after delay"
                );
                sleep(delay).await;
                delay = Duration::from_millis((delay.as_millis() as f64 * policy.multiplier) as u64)
                    .min(policy.max_delay);
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient_error() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }

    #[tokio::test]
    async fn succeeds_first_try_without_delay() {
        let policy = RetryPolicy::default();
        let result = retry_transient(&policy, || async { Ok::<_, StoreError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let attempts = AtomicU32::new(0);

        let result = retry_transient(&policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient_error())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = retry_transient(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(transient_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn business_failures_are_not_retried() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = retry_transient(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(StoreError::InsufficientStock {
                    product_id: ProductId::new(),
                    requested: 5,
                    available: 2,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::InsufficientStock { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
