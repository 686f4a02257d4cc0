//! Token Bucket
//!
//! Continuous-refill token counter backing the per-client admission decision.

use std::time::Instant;

// == Token Bucket ==
/// A token bucket that refills continuously over time.
///
/// Each admitted request consumes one token. Tokens accrue at `refill_rate`
/// per second up to `capacity`. A bucket starts full, so a newly seen client
/// gets an initial burst of `capacity` requests before refill pacing kicks in.
///
/// All methods take an explicit `now` so callers (and tests) control the
/// clock; the bucket itself never reads wall time.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Maximum number of tokens the bucket can hold
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    /// Tokens currently available, always in [0, capacity]
    tokens: f64,
    /// Instant of the last refill calculation
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity,
            refill_rate,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Attempts to consume one token at time `now`.
    ///
    /// Refills first, proportional to the time elapsed since the previous
    /// call and capped at capacity, then consumes a token if at least one
    /// whole token is available.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> f64 {
        self.tokens
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> f64 {
        self.capacity
    }
}
