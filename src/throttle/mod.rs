//! Throttle Module
//!
//! Per-client admission control using token buckets with idle eviction.

mod bucket;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use bucket::TokenBucket;
pub use store::{Admission, ThrottleStore};
