//! Background Task Tracker
//!
//! Counts outstanding fire-and-forget work so shutdown can wait for it, and
//! isolates faults inside backgrounded work from the path that spawned it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::error;

// == Fault Reporting ==
/// Collaborator that receives faults from backgrounded work.
///
/// A unit of work that returns an error or panics is reported here and then
/// counted as complete; the fault never reaches the caller that spawned it.
pub trait FaultReporter: Send + Sync {
    fn report(&self, context: &str, err: &anyhow::Error);
}

/// Default reporter that writes faults to the log stream.
pub struct LogReporter;

impl FaultReporter for LogReporter {
    fn report(&self, context: &str, err: &anyhow::Error) {
        error!(context, error = %err, "background task failed");
    }
}

// == Drain Outcome ==
/// Result of waiting for outstanding work to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The outstanding count reached zero before the deadline
    Drained,
    /// The deadline elapsed with work still outstanding
    TimedOut,
}

// == Task Tracker ==
/// Tracks units of background work from registration to completion.
///
/// Each unit is registered (counted) before it is dispatched, runs on its
/// own tokio task, and is counted as complete only once its terminal outcome
/// is known. A waiter therefore never observes a zero count while any
/// registered unit is still running.
#[derive(Clone)]
pub struct TaskTracker {
    outstanding: Arc<watch::Sender<usize>>,
    reporter: Arc<dyn FaultReporter>,
}

impl TaskTracker {
    /// Creates a tracker with no outstanding work.
    pub fn new(reporter: Arc<dyn FaultReporter>) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            outstanding: Arc::new(tx),
            reporter,
        }
    }

    /// Registers one unit of background work and runs it on its own task.
    ///
    /// The caller returns immediately. If `work` returns an error or panics,
    /// the fault is passed to the [`FaultReporter`] and the unit still
    /// counts as complete; nothing propagates back to the caller.
    ///
    /// # Arguments
    /// * `context` - short label identifying the work in fault reports
    /// * `work` - the unit of work to run
    pub fn run<F>(&self, context: &'static str, work: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        // Count the unit before it can start, so a concurrent wait() never
        // observes a false zero between dispatch and first poll.
        self.outstanding.send_modify(|n| *n += 1);

        let handle = tokio::spawn(work);
        let outstanding = self.outstanding.clone();
        let reporter = self.reporter.clone();

        // Supervisor task: observe the terminal outcome (including a panic,
        // which surfaces as a JoinError), report faults, then decrement.
        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => reporter.report(context, &err),
                Err(join_err) => {
                    let err = anyhow::anyhow!("background task aborted: {join_err}");
                    reporter.report(context, &err);
                }
            }
            outstanding.send_modify(|n| *n -= 1);
        });
    }

    /// Number of registered units that have not yet completed.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Blocks until all outstanding work completes or `deadline` elapses.
    ///
    /// `None` waits without a ceiling. Work that outlives a deadline is
    /// abandoned by the waiter, not cancelled; it finishes on its own.
    pub async fn wait(&self, deadline: Option<Duration>) -> DrainOutcome {
        let mut rx = self.outstanding.subscribe();
        let drained = async move {
            // The tracker holds the sender, so the channel cannot close
            // while this borrow is alive.
            let _ = rx.wait_for(|n| *n == 0).await;
        };

        match deadline {
            Some(limit) => match tokio::time::timeout(limit, drained).await {
                Ok(()) => DrainOutcome::Drained,
                Err(_) => DrainOutcome::TimedOut,
            },
            None => {
                drained.await;
                DrainOutcome::Drained
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Reporter that collects fault contexts for assertions.
    struct CollectingReporter {
        faults: Mutex<Vec<String>>,
    }

    impl CollectingReporter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                faults: Mutex::new(Vec::new()),
            })
        }

        fn contexts(&self) -> Vec<String> {
            self.faults.lock().unwrap().clone()
        }
    }

    impl FaultReporter for CollectingReporter {
        fn report(&self, context: &str, err: &anyhow::Error) {
            self.faults
                .lock()
                .unwrap()
                .push(format!("{context}: {err}"));
        }
    }

    #[tokio::test]
    async fn test_wait_drains_after_all_units_complete() {
        let tracker = TaskTracker::new(Arc::new(LogReporter));
        let completed = Arc::new(AtomicUsize::new(0));

        // Five units finishing in randomized order.
        for _ in 0..5 {
            let delay = rand::thread_rng().gen_range(10..50);
            let completed = completed.clone();
            tracker.run("test unit", async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(tracker.outstanding(), 5);

        let outcome = tracker.wait(Some(Duration::from_secs(5))).await;

        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(
            completed.load(Ordering::SeqCst),
            5,
            "wait must not return drained before every unit completed"
        );
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_times_out_on_stuck_unit() {
        let tracker = TaskTracker::new(Arc::new(LogReporter));

        tracker.run("stuck unit", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let outcome = tracker.wait(Some(Duration::from_millis(50))).await;
        assert_eq!(outcome, DrainOutcome::TimedOut);
        assert_eq!(tracker.outstanding(), 1, "stuck unit is abandoned, not cancelled");
    }

    #[tokio::test]
    async fn test_error_is_reported_and_count_reaches_zero() {
        let reporter = CollectingReporter::new();
        let tracker = TaskTracker::new(reporter.clone());

        tracker.run("failing unit", async {
            Err(anyhow::anyhow!("delivery endpoint unreachable"))
        });

        let outcome = tracker.wait(Some(Duration::from_secs(1))).await;
        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(tracker.outstanding(), 0);

        let contexts = reporter.contexts();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].contains("failing unit"));
        assert!(contexts[0].contains("delivery endpoint unreachable"));
    }

    #[tokio::test]
    async fn test_panic_is_reported_and_count_reaches_zero() {
        let reporter = CollectingReporter::new();
        let tracker = TaskTracker::new(reporter.clone());

        tracker.run("panicking unit", async { panic!("boom") });

        let outcome = tracker.wait(Some(Duration::from_secs(1))).await;
        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(tracker.outstanding(), 0);
        assert_eq!(reporter.contexts().len(), 1);
    }

    #[tokio::test]
    async fn test_wait_with_no_outstanding_work_returns_immediately() {
        let tracker = TaskTracker::new(Arc::new(LogReporter));
        let outcome = tracker.wait(Some(Duration::from_millis(10))).await;
        assert_eq!(outcome, DrainOutcome::Drained);
    }
}
