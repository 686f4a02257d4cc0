//! Server Lifecycle
//!
//! Owns the serve loop and the shutdown state machine: Running -> Draining
//! -> Stopped, one way only. A termination signal or a programmatic
//! `shutdown()` call starts the drain; open connections get a bounded grace
//! period, then tracked background work gets its own, and the outcome of
//! both phases is reported to the caller.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::tracker::{DrainOutcome, TaskTracker};

// == Lifecycle State ==
/// Shutdown state machine position. Transitions are irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting connections
    Running,
    /// Refusing new connections, letting in-flight work finish
    Draining,
    /// Terminal
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }
}

// == Serve Error ==
/// Transport-level failure of the serve loop. This is the only condition
/// that becomes a process-fatal outcome; drain timeouts are reported in the
/// [`ShutdownReport`] instead.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("server failed: {0}")]
    Io(#[from] std::io::Error),
}

// == Shutdown Report ==
/// Per-phase outcome of a completed shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Did open connections finish within the drain deadline?
    pub connections: DrainOutcome,
    /// Did tracked background work finish within its deadline?
    pub background: DrainOutcome,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.connections == DrainOutcome::Drained && self.background == DrainOutcome::Drained
    }
}

// == Shutdown Coordinator ==
/// Drives the serve loop and coordinates the drain sequence.
///
/// The trigger is injectable: OS signals are just one caller of
/// [`shutdown`](ShutdownCoordinator::shutdown), so tests can drive the whole
/// state machine without sending real signals.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    state: Arc<watch::Sender<LifecycleState>>,
    drain_deadline: Duration,
    background_deadline: Option<Duration>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator in the Running state.
    ///
    /// # Arguments
    /// * `drain_deadline` - grace period for open connections
    /// * `background_deadline` - grace period for tracked background work
    ///   (`None` waits without a ceiling)
    pub fn new(drain_deadline: Duration, background_deadline: Option<Duration>) -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Running);
        Self {
            state: Arc::new(tx),
            drain_deadline,
            background_deadline,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch the lifecycle state; used by the health endpoint and the serve
    /// loop itself.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Requests drain. Idempotent; only the Running -> Draining edge does
    /// anything, later calls and calls after Stopped are ignored.
    pub fn shutdown(&self) {
        self.state.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Draining;
                true
            } else {
                false
            }
        });
    }

    /// Spawns a listener that maps SIGINT/SIGTERM onto [`shutdown`](Self::shutdown).
    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
            };

            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("received Ctrl+C, initiating shutdown");
                }
                _ = terminate => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }

            coordinator.shutdown();
        })
    }

    /// Runs the server until shutdown completes.
    ///
    /// The listener stops accepting as soon as the state leaves Running.
    /// Connections still open then get `drain_deadline` to finish; tracked
    /// background work gets its own deadline after that. Work that outlives
    /// a deadline is abandoned and reported, not killed.
    ///
    /// # Errors
    /// Returns [`ServeError`] only if the serve loop itself fails; a
    /// signal-triggered shutdown is not an error.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
        tracker: TaskTracker,
    ) -> Result<ShutdownReport, ServeError> {
        let mut trigger_rx = self.subscribe();
        let trigger = async move {
            // A closed channel would mean the coordinator is gone; treat it
            // the same as a drain request.
            let _ = trigger_rx
                .wait_for(|state| *state != LifecycleState::Running)
                .await;
        };

        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(trigger)
        .into_future();
        let mut server = std::pin::pin!(server);

        let mut state_rx = self.subscribe();
        let connections = tokio::select! {
            result = &mut server => {
                // The serve loop ended before any drain was requested; an
                // error here is fatal.
                result?;
                DrainOutcome::Drained
            }
            _ = async {
                // Drop the watch guard inside this block so the serve
                // future stays Send.
                let _ = state_rx
                    .wait_for(|state| *state == LifecycleState::Draining)
                    .await;
            } => {
                info!(
                    deadline_secs = self.drain_deadline.as_secs(),
                    "draining open connections"
                );
                match tokio::time::timeout(self.drain_deadline, &mut server).await {
                    Ok(result) => {
                        result?;
                        DrainOutcome::Drained
                    }
                    Err(_) => {
                        warn!("connection drain deadline elapsed");
                        DrainOutcome::TimedOut
                    }
                }
            }
        };

        info!(
            outstanding = tracker.outstanding(),
            "waiting for background tasks to complete"
        );
        let background = tracker.wait(self.background_deadline).await;
        if background == DrainOutcome::TimedOut {
            warn!(
                outstanding = tracker.outstanding(),
                "background drain deadline elapsed, abandoning remaining work"
            );
        }

        self.state.send_replace(LifecycleState::Stopped);
        info!("server stopped");

        Ok(ShutdownReport {
            connections,
            background,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{create_router, AppState};
    use crate::dispatch::{LogTransport, Notifier, RetryPolicy};
    use crate::throttle::ThrottleStore;
    use crate::tracker::LogReporter;
    use tokio::sync::RwLock;

    fn test_coordinator(background_deadline: Option<Duration>) -> ShutdownCoordinator {
        ShutdownCoordinator::new(Duration::from_secs(5), background_deadline)
    }

    fn test_state(coordinator: &ShutdownCoordinator, tracker: TaskTracker) -> AppState {
        let store = ThrottleStore::new(100.0, 50.0, Duration::from_secs(180));
        AppState::new(
            Arc::new(RwLock::new(store)),
            tracker,
            Notifier::new(Arc::new(LogTransport), RetryPolicy::default()),
            coordinator.subscribe(),
        )
    }

    #[test]
    fn test_shutdown_transitions_are_one_way() {
        let coordinator = test_coordinator(None);
        assert_eq!(coordinator.state(), LifecycleState::Running);

        coordinator.shutdown();
        assert_eq!(coordinator.state(), LifecycleState::Draining);

        // A second request is a no-op.
        coordinator.shutdown();
        assert_eq!(coordinator.state(), LifecycleState::Draining);
    }

    #[tokio::test]
    async fn test_clean_shutdown_reports_both_phases_drained() {
        let coordinator = test_coordinator(Some(Duration::from_secs(5)));
        let tracker = TaskTracker::new(Arc::new(LogReporter));
        let state = test_state(&coordinator, tracker.clone());
        let router = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let serve_coordinator = coordinator.clone();
        let server =
            tokio::spawn(async move { serve_coordinator.serve(listener, router, tracker).await });

        // The server answers while Running.
        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(response.status(), 200);

        coordinator.shutdown();
        let report = server.await.unwrap().unwrap();

        assert!(report.is_clean());
        assert_eq!(coordinator.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_stuck_background_work_times_out_in_report() {
        let coordinator = test_coordinator(Some(Duration::from_millis(100)));
        let tracker = TaskTracker::new(Arc::new(LogReporter));
        let state = test_state(&coordinator, tracker.clone());
        let router = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        // A unit that will not finish within the background deadline.
        tracker.run("stuck unit", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let serve_coordinator = coordinator.clone();
        let tracker_for_serve = tracker.clone();
        let server = tokio::spawn(async move {
            serve_coordinator
                .serve(listener, router, tracker_for_serve)
                .await
        });

        coordinator.shutdown();
        let report = server.await.unwrap().unwrap();

        assert_eq!(report.connections, DrainOutcome::Drained);
        assert_eq!(report.background, DrainOutcome::TimedOut);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_background_work() {
        let coordinator = test_coordinator(Some(Duration::from_secs(5)));
        let tracker = TaskTracker::new(Arc::new(LogReporter));
        let state = test_state(&coordinator, tracker.clone());
        let router = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        tracker.run("short unit", async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        });

        let serve_coordinator = coordinator.clone();
        let tracker_for_serve = tracker.clone();
        let server = tokio::spawn(async move {
            serve_coordinator
                .serve(listener, router, tracker_for_serve)
                .await
        });

        coordinator.shutdown();
        let report = server.await.unwrap().unwrap();

        assert!(report.is_clean());
        assert_eq!(tracker.outstanding(), 0);
    }
}
