//! Throttle Store Module
//!
//! Maps client identities to token buckets and evicts idle clients.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::throttle::TokenBucket;

// == Admission Decision ==
/// Outcome of an admission check. `Deny` is normal control flow, not an
/// error; callers translate it into a rate-limit rejection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

// == Client Record ==
/// Per-client limiter state. At most one record exists per client identity.
#[derive(Debug)]
struct ClientRecord {
    /// Token bucket governing this client's request rate
    bucket: TokenBucket,
    /// Instant of the client's most recent admission check
    last_seen: Instant,
}

// == Throttle Store ==
/// Per-client admission state for the whole server.
///
/// The store is shared as `Arc<RwLock<ThrottleStore>>`; all record mutation
/// and all structural changes (creation, eviction) happen under the write
/// lock, so an admission check can never race the sweeper on the same
/// record.
#[derive(Debug)]
pub struct ThrottleStore {
    /// Client identity -> limiter state
    clients: HashMap<String, ClientRecord>,
    /// Bucket capacity for new clients
    capacity: f64,
    /// Refill rate in tokens per second
    refill_rate: f64,
    /// Clients idle longer than this are removed by the sweep
    idle_after: Duration,
}

impl ThrottleStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `capacity` - burst size granted to each client (bucket starts full)
    /// * `refill_rate` - sustained tokens per second per client
    /// * `idle_after` - idle threshold after which a client record is evicted
    pub fn new(capacity: f64, refill_rate: f64, idle_after: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            capacity,
            refill_rate,
            idle_after,
        }
    }

    // == Admit ==
    /// Runs the admission check for one client identity.
    ///
    /// Creates a fresh full bucket on first sight, refreshes the client's
    /// `last_seen`, then consumes one token if available. Distinct clients
    /// never affect each other's outcome.
    pub fn admit(&mut self, client_id: &str) -> Admission {
        self.admit_at(client_id, Instant::now())
    }

    pub(crate) fn admit_at(&mut self, client_id: &str, now: Instant) -> Admission {
        let record = self
            .clients
            .entry(client_id.to_string())
            .or_insert_with(|| ClientRecord {
                bucket: TokenBucket::new(self.capacity, self.refill_rate, now),
                last_seen: now,
            });

        // Refresh before deciding, so a concurrent sweep cycle cannot treat
        // an actively admitting client as idle.
        record.last_seen = now;

        if record.bucket.try_acquire(now) {
            Admission::Allow
        } else {
            Admission::Deny
        }
    }

    // == Sweep ==
    /// Removes every client idle longer than the configured threshold.
    ///
    /// Returns the number of records removed. A client swept and then seen
    /// again starts over with a fresh full bucket.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.clients.len();
        let idle_after = self.idle_after;
        self.clients
            .retain(|_, record| now.saturating_duration_since(record.last_seen) <= idle_after);
        before - self.clients.len()
    }

    /// Number of clients currently tracked.
    pub fn active_clients(&self) -> usize {
        self.clients.len()
    }
}
