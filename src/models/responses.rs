//! Response DTOs for the API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,
    /// Current lifecycle state (running, draining, stopped)
    pub lifecycle: String,
    /// Background units registered and not yet completed
    pub outstanding_tasks: usize,
}

/// Response body for POST /notifications
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub message: String,
    pub recipient: String,
}

impl NotifyResponse {
    /// Builds the acknowledgement for an accepted (queued) notification.
    pub fn queued(recipient: String) -> Self {
        Self {
            message: "notification accepted for delivery".to_string(),
            recipient,
        }
    }
}
