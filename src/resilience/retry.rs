//! Retry executor
//!
//! Wraps an async operation with bounded retries and pure exponential backoff.

use std::future::Future;
use tokio::time::Duration;

/// Configuration for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// The operation failed on every allowed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    pub attempts: u32,
    /// Error from the final attempt.
    pub last: E,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after the zero-indexed failed `attempt`: base * 2^attempt.
    /// No jitter and no cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// `on_retry(attempt, delay, &err)` is called before each backoff sleep with the
    /// one-based number of the attempt that just failed.
    pub async fn run<T, E, F, Fut, R>(&self, mut op: F, mut on_retry: R) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(u32, Duration, &E),
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(RetryError {
                            attempts: attempt + 1,
                            last: err,
                        });
                    }
                    let delay = self.backoff(attempt);
                    on_retry(attempt + 1, delay, &err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
