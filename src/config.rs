//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::dispatch::RetryPolicy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Per-client token bucket capacity (burst size)
    pub throttle_burst: f64,
    /// Per-client sustained rate in tokens per second
    pub throttle_rate: f64,
    /// Seconds of inactivity after which a client's limiter is evicted
    pub throttle_idle_secs: u64,
    /// Seconds between idle-client sweep runs
    pub sweep_interval_secs: u64,
    /// Delivery attempts per notification
    pub retry_attempts: u32,
    /// Fixed delay between failed delivery attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Deadline for draining open connections at shutdown, in seconds
    pub drain_deadline_secs: u64,
    /// Deadline for draining background work at shutdown, in seconds
    /// (0 disables the ceiling)
    pub background_deadline_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 4000)
    /// - `THROTTLE_BURST` - bucket capacity per client (default: 4)
    /// - `THROTTLE_RATE` - tokens per second per client (default: 2.0)
    /// - `THROTTLE_IDLE_SECS` - idle eviction threshold (default: 180)
    /// - `SWEEP_INTERVAL_SECS` - sweep frequency (default: 1)
    /// - `RETRY_ATTEMPTS` - delivery attempts (default: 3)
    /// - `RETRY_DELAY_MS` - delay between attempts (default: 500)
    /// - `DRAIN_DEADLINE_SECS` - connection drain deadline (default: 5)
    /// - `BACKGROUND_DEADLINE_SECS` - background drain deadline, 0 = unbounded (default: 30)
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("SERVER_PORT", 4000),
            throttle_burst: parse_env("THROTTLE_BURST", 4.0),
            throttle_rate: parse_env("THROTTLE_RATE", 2.0),
            throttle_idle_secs: parse_env("THROTTLE_IDLE_SECS", 180),
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 1),
            retry_attempts: parse_env("RETRY_ATTEMPTS", 3),
            retry_delay_ms: parse_env("RETRY_DELAY_MS", 500),
            drain_deadline_secs: parse_env("DRAIN_DEADLINE_SECS", 5),
            background_deadline_secs: parse_env("BACKGROUND_DEADLINE_SECS", 30),
        }
    }

    /// Idle threshold for client limiter eviction.
    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.throttle_idle_secs)
    }

    /// Interval between sweep runs.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Retry policy for outbound deliveries.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Deadline for the connection drain phase of shutdown.
    pub fn drain_deadline(&self) -> Duration {
        Duration::from_secs(self.drain_deadline_secs)
    }

    /// Deadline for the background drain phase of shutdown; `None` waits
    /// without a ceiling.
    pub fn background_deadline(&self) -> Option<Duration> {
        if self.background_deadline_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.background_deadline_secs))
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4000,
            throttle_burst: 4.0,
            throttle_rate: 2.0,
            throttle_idle_secs: 180,
            sweep_interval_secs: 1,
            retry_attempts: 3,
            retry_delay_ms: 500,
            drain_deadline_secs: 5,
            background_deadline_secs: 30,
        }
    }
}
