//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tokio::sync::{watch, RwLock};

use crate::config::Config;
use crate::dispatch::{LogTransport, Notification, Notifier};
use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, NotifyRequest, NotifyResponse};
use crate::server::LifecycleState;
use crate::throttle::ThrottleStore;
use crate::tracker::TaskTracker;

/// Application state shared across handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Per-client admission state, shared with the sweep task
    pub throttle: Arc<RwLock<ThrottleStore>>,
    /// Background work tracker, shared with the shutdown coordinator
    pub tracker: TaskTracker,
    /// Outbound notification sender
    pub notifier: Notifier,
    /// Lifecycle state, observed for the health endpoint
    pub lifecycle: watch::Receiver<LifecycleState>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        throttle: Arc<RwLock<ThrottleStore>>,
        tracker: TaskTracker,
        notifier: Notifier,
        lifecycle: watch::Receiver<LifecycleState>,
    ) -> Self {
        Self {
            throttle,
            tracker,
            notifier,
            lifecycle,
        }
    }

    /// Creates a new AppState from configuration, with the default
    /// log-backed delivery transport.
    pub fn from_config(
        config: &Config,
        tracker: TaskTracker,
        lifecycle: watch::Receiver<LifecycleState>,
    ) -> Self {
        let throttle = ThrottleStore::new(
            config.throttle_burst,
            config.throttle_rate,
            config.idle_after(),
        );
        let notifier = Notifier::new(Arc::new(LogTransport), config.retry_policy());
        Self::new(Arc::new(RwLock::new(throttle)), tracker, notifier, lifecycle)
    }
}

/// Handler for GET /health
///
/// Reports service availability, the shutdown lifecycle state, and the
/// number of background units still outstanding.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let lifecycle = *state.lifecycle.borrow();

    Json(HealthResponse {
        status: "available".to_string(),
        lifecycle: lifecycle.as_str().to_string(),
        outstanding_tasks: state.tracker.outstanding(),
    })
}

/// Handler for POST /notifications
///
/// Validates the request, acknowledges with 202 immediately, and hands the
/// actual delivery to the background tracker. A delivery failure after the
/// response is sent is reported through the tracker's fault path; it never
/// affects this request's outcome.
pub async fn notify_handler(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<NotifyResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let note = Notification {
        recipient: req.recipient.clone(),
        subject: req.subject,
        body: req.body,
    };

    let notifier = state.notifier.clone();
    state
        .tracker
        .run("notification delivery", async move { notifier.send(note).await });

    Ok((
        StatusCode::ACCEPTED,
        Json(NotifyResponse::queued(req.recipient)),
    ))
}
