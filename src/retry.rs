use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ApiError;

/// Retry settings: `attempts` total invocations, with a linearly growing
/// pause (`base_delay` x attempt number) between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Re-invoke `op` until it succeeds or the attempt budget is spent, then hand
/// the final error back to the caller, which decides whether to skip the item.
/// Shape errors are never retried.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.retryable() && attempt < policy.attempts => {
                warn!(
                    "{} attempt {}/{} failed: {}",
                    what, attempt, policy.attempts, e
                );
                tokio::time::sleep(policy.base_delay * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn exhaustion_surfaces_final_error_after_three_calls() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::Transport("connection refused".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn succeeds_on_second_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ApiError::Status(503))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shape_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::Shape("tags".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ApiError::Shape(_))));
    }
}
