//! Notifier
//!
//! Outbound notification hand-off behind an injectable transport, with
//! bounded retry around each delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::dispatch::RetryPolicy;

// == Notification ==
/// One outbound message. Ephemeral; nothing is persisted about a delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

// == Transport ==
/// Delivery endpoint for notifications. The wire protocol behind it (SMTP
/// dial-and-send, webhook, ...) is the implementor's business; only the
/// success or failure of one delivery attempt matters here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, note: &Notification) -> anyhow::Result<()>;
}

/// Transport that records the hand-off in the log stream instead of talking
/// to a real delivery endpoint.
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, note: &Notification) -> anyhow::Result<()> {
        info!(
            recipient = %note.recipient,
            subject = %note.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

// == Notifier ==
/// Sends notifications through the configured transport, retrying failed
/// deliveries per the retry policy.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Delivers `note`, retrying on failure. Returns the last delivery
    /// error once the attempt budget is spent.
    pub async fn send(&self, note: Notification) -> anyhow::Result<()> {
        self.retry.run(|| self.transport.deliver(&note)).await
    }
}
