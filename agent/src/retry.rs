// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::constants::{DEFAULT_MAX_ATTEMPTS, RETRY_BASE_DELAY, RETRY_MAX_DELAY};
use crate::errors::{AgentError, MetadataError};

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
            max_delay: RETRY_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based), somewhere in
    /// the upper half of the capped exponential delay.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let millis = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
        let half = millis / 2;
        Duration::from_millis(half + fastrand::u64(0..=millis - half))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. Both the operation and the backoff sleeps give way
/// to `cancel`.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    what: &str,
    mut operation: F,
) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MetadataError>>,
{
    let mut attempt = 1;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            result = operation() => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    "[worker] {} failed (attempt {}/{}), retrying in {:?}: {}",
                    what,
                    attempt,
                    policy.max_attempts,
                    delay,
                    e
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("[worker] {} failed after {} attempt(s): {}", what, attempt, e);
                return Err(e.into());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn unavailable() -> MetadataError {
        MetadataError::unavailable("http://metadata", "connection refused")
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let first = policy.backoff(1);
            assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));

            let third = policy.backoff(3);
            assert!(third >= Duration::from_millis(200) && third <= Duration::from_millis(400));

            let late = policy.backoff(40);
            assert!(late >= Duration::from_secs(1) && late <= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_unavailable_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry(&RetryPolicy::default(), &CancellationToken::new(), "fetch", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok("sekrit-token")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "sekrit-token");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> =
            retry(&RetryPolicy::default(), &CancellationToken::new(), "fetch", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            })
            .await;
        assert!(matches!(
            result,
            Err(AgentError::Metadata(MetadataError::Unavailable { .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> =
            retry(&RetryPolicy::default(), &CancellationToken::new(), "fetch", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MetadataError::malformed("http://metadata", "empty response"))
            })
            .await;
        assert!(matches!(
            result,
            Err(AgentError::Metadata(MetadataError::Malformed { .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let cancel = &CancellationToken::new();
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&RetryPolicy::default(), cancel, "fetch", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            Err(unavailable())
        })
        .await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_pending_operation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let result: Result<(), _> = retry(&RetryPolicy::default(), &cancel, "fetch", || {
            std::future::pending::<Result<(), MetadataError>>()
        })
        .await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
