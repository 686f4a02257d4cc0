//! Gatehouse - A rate-limited HTTP API server
//!
//! Provides per-client admission control, background work tracking with
//! bounded-retry dispatch, and coordinated graceful shutdown.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Create the throttle store and background task tracker
//! 4. Start the idle-client sweep task
//! 5. Create the Axum router with admission middleware
//! 6. Bind the listener and install signal handling
//! 7. Serve until shutdown, then report how the drain went

mod api;
mod config;
mod dispatch;
mod error;
mod models;
mod server;
mod tasks;
mod throttle;
mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use server::ShutdownCoordinator;
use tasks::spawn_sweep_task;
use tracker::{LogReporter, TaskTracker};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting gatehouse server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "configuration loaded: port={}, burst={}, rate={}/s, idle_evict={}s, retry={}x{}ms, drain={}s",
        config.server_port,
        config.throttle_burst,
        config.throttle_rate,
        config.throttle_idle_secs,
        config.retry_attempts,
        config.retry_delay_ms,
        config.drain_deadline_secs
    );

    // Shutdown coordinator and background work tracker
    let coordinator =
        ShutdownCoordinator::new(config.drain_deadline(), config.background_deadline());
    let tracker = TaskTracker::new(Arc::new(LogReporter));

    // Application state with throttle store and notifier
    let state = AppState::from_config(&config, tracker.clone(), coordinator.subscribe());

    // Start background sweep task for idle client eviction
    let sweep_handle = spawn_sweep_task(state.throttle.clone(), config.sweep_interval());

    // Create router with all endpoints behind the admission filter
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("server listening on http://{}", addr);

    // Map SIGINT/SIGTERM onto the coordinator's drain trigger
    coordinator.spawn_signal_listener();

    // Serve until shutdown completes
    match coordinator.serve(listener, app, tracker).await {
        Ok(report) if report.is_clean() => {
            info!("server shutdown complete");
        }
        Ok(report) => {
            warn!(?report, "server shutdown incomplete, some work was abandoned");
        }
        Err(err) => {
            error!(%err, "server failed");
            sweep_handle.abort();
            std::process::exit(1);
        }
    }

    sweep_handle.abort();
}
