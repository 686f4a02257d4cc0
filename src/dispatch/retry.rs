//! Bounded Retry
//!
//! Wraps an unreliable async operation with a fixed number of attempts and a
//! fixed delay between failed attempts. No backoff growth, no jitter; the
//! interval is deliberately constant.

use std::future::Future;
use std::time::Duration;

// == Retry Policy ==
/// Attempt count and inter-attempt delay for one delivery.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (always at least 1)
    pub attempts: u32,
    /// Fixed delay between a failed attempt and the next one
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. An attempt count of zero is clamped to one, so the
    /// operation always runs at least once.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the first success immediately. Sleeps for the fixed delay
    /// only between attempts; after the final failure the last error is
    /// returned without a trailing sleep.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts => return Err(err),
                Err(_) => {}
            }
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}
