//! Property-Based Tests for the Throttle Module
//!
//! Uses proptest to verify the bucket-state invariants under arbitrary
//! interleavings of admission checks and elapsed time.

use proptest::prelude::*;
use std::time::{Duration, Instant};

use crate::throttle::{Admission, ThrottleStore, TokenBucket};

// == Strategies ==
/// A single step against a bucket: either an acquire attempt or the clock
/// advancing by some number of milliseconds.
#[derive(Debug, Clone)]
enum BucketOp {
    Acquire,
    Elapse(u64),
}

fn bucket_op_strategy() -> impl Strategy<Value = BucketOp> {
    prop_oneof![
        3 => Just(BucketOp::Acquire),
        1 => (0u64..5_000).prop_map(BucketOp::Elapse),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of acquires and time steps, the token count stays
    // within [0, capacity].
    #[test]
    fn prop_tokens_stay_within_bounds(
        capacity in 1u32..16,
        rate in 0.1f64..10.0,
        ops in prop::collection::vec(bucket_op_strategy(), 1..100),
    ) {
        let mut now = Instant::now();
        let mut bucket = TokenBucket::new(f64::from(capacity), rate, now);

        for op in ops {
            match op {
                BucketOp::Acquire => {
                    let _ = bucket.try_acquire(now);
                }
                BucketOp::Elapse(ms) => {
                    now += Duration::from_millis(ms);
                }
            }
            prop_assert!(bucket.tokens() >= 0.0);
            prop_assert!(bucket.tokens() <= bucket.capacity() + f64::EPSILON);
        }
    }

    // *For any* integer capacity, a fresh client gets exactly `capacity`
    // consecutive allows with no elapsed time, then a deny.
    #[test]
    fn prop_fresh_client_burst_is_exactly_capacity(capacity in 1u32..16) {
        let mut store = ThrottleStore::new(
            f64::from(capacity),
            2.0,
            Duration::from_secs(180),
        );
        let now = Instant::now();

        for _ in 0..capacity {
            prop_assert_eq!(store.admit_at("client", now), Admission::Allow);
        }
        prop_assert_eq!(store.admit_at("client", now), Admission::Deny);
    }
}
