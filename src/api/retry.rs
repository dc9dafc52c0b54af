//! Rate-limit retry policy.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::OptionsConfig;
use crate::error::Result;

/// Retries rate-limited requests with a 5x growing backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Backoff unit; retry `n` waits `unit * 5^n`.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_options(options: &OptionsConfig) -> Self {
        Self {
            retries: options.rate_limit_retries,
            unit: Duration::from_millis(options.backoff_unit_ms),
        }
    }

    /// Delay before the `attempt`-th retry (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(5u32.saturating_pow(attempt))
    }

    /// Run `op`, retrying while it fails with a rate-limit error.
    ///
    /// Any other error, or the last rate-limit error once retries run out,
    /// is returned as is.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_rate_limit() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited fetching {}, backing off",
                        what
                    );
                    sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            retries: 3,
            unit: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_sequence() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(5));
        assert_eq!(policy.delay(2), Duration::from_secs(25));
        assert_eq!(policy.delay(3), Duration::from_secs(125));
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy()
            .run("page", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::RateLimited(429))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = fast_policy()
            .run("page", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::RateLimited(403))
            })
            .await;
        assert!(matches!(result, Err(Error::RateLimited(403))));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = fast_policy()
            .run("page", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::HttpStatus {
                    status: 500,
                    url: "u".into(),
                })
            })
            .await;
        assert!(matches!(result, Err(Error::HttpStatus { status: 500, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
