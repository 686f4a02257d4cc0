//! Gatehouse - A rate-limited HTTP API server
//!
//! Provides per-client admission control, background work tracking with
//! bounded-retry dispatch, and coordinated graceful shutdown.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod server;
pub mod tasks;
pub mod throttle;
pub mod tracker;

pub use api::{create_router, AppState};
pub use config::Config;
pub use server::{LifecycleState, ServeError, ShutdownCoordinator, ShutdownReport};
pub use tasks::spawn_sweep_task;
pub use tracker::{DrainOutcome, FaultReporter, LogReporter, TaskTracker};
