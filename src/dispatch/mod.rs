//! Dispatch Module
//!
//! Outbound notification delivery: a bounded fixed-interval retry primitive
//! and a notifier that pushes messages through an injected transport.

mod notifier;
mod retry;

// Re-export public types
pub use notifier::{LogTransport, Notification, Notifier, Transport};
pub use retry::RetryPolicy;
