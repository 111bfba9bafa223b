//! The generic `OperationTracker`.
//!
//! A tracker supervises one remote operation. It owns:
//! - the latest snapshot, replaced wholesale under a write lock
//! - a stop channel that halts its polling task
//! - exactly one background polling task
//!
//! ```text
//!            start(initial)
//!                 │
//!      terminal? ─┼─ yes ──────────────────────────────┐
//!                 │ no                                 │
//!                 ▼                                    ▼
//!   ┌──────────────────────────┐   terminal    ┌──────────────┐
//!   │ poll: sleep → fetch →    │ ────────────> │   released   │
//!   │ replace current          │               │ (stop sent,  │
//!   └──────────────────────────┘ ────────────> │  task ends)  │
//!        ▲   refresh_status()    dispose()/drop└──────────────┘
//!        └── cancel() ─┘
//! ```
//!
//! Release happens once, whichever of terminal snapshot, `dispose`,
//! `dispose_async` or `Drop` gets there first.

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::TrackerConfig;
use crate::error::{BoxError, TrackerError, TrackerResult};
use crate::metrics::{PollOutcome, TrackerMetrics};
use crate::signal::{CancelSignal, fired};
use crate::snapshot::{OperationPhase, OperationSnapshot};
use crate::source::{FnSource, OperationSource};

/// State shared between the tracker handle and its polling task.
struct Shared<S: OperationSnapshot> {
    operation_id: String,
    current: RwLock<Arc<S>>,
    source: Arc<dyn OperationSource<S>>,
    config: TrackerConfig,
    metrics: TrackerMetrics,
    /// Flipped under the `current` write lock so no snapshot lands after it
    released: AtomicBool,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    /// Successful releases, for asserting the once-only teardown
    #[cfg(test)]
    releases: std::sync::atomic::AtomicU32,
}

impl<S: OperationSnapshot> Shared<S> {
    fn current(&self) -> Arc<S> {
        Arc::clone(&self.current.read())
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn disposed_error(&self) -> TrackerError {
        TrackerError::Disposed {
            operation_id: self.operation_id.clone(),
        }
    }

    /// Fetch once and apply the result.
    ///
    /// Used by both the polling task and explicit calls.
    async fn refresh(&self) -> TrackerResult<Arc<S>> {
        let fetched = match self.source.fetch_status().await {
            Ok(snapshot) => snapshot,
            Err(source) => {
                self.metrics.poll(PollOutcome::Error);
                return Err(TrackerError::StatusFetch {
                    operation_id: self.operation_id.clone(),
                    source,
                });
            }
        };

        self.apply(fetched)
    }

    /// Swap in a fetched snapshot.
    ///
    /// A stored terminal snapshot is never replaced, and nothing is written
    /// once the tracker is released. Only the caller that stores the first
    /// terminal snapshot goes on to release.
    fn apply(&self, fetched: S) -> TrackerResult<Arc<S>> {
        let (snapshot, reached_terminal) = {
            let mut current = self.current.write();
            if current.is_terminal() {
                return Ok(Arc::clone(&current));
            }
            if self.is_released() {
                return Err(self.disposed_error());
            }

            *current = Arc::new(fetched);
            (Arc::clone(&current), current.is_terminal())
        };

        if reached_terminal {
            self.metrics.poll(PollOutcome::Terminal);
            info!(
                operation_id = %self.operation_id,
                state = %snapshot.state_name(),
                phase = snapshot.phase().as_str(),
                "Operation reached terminal state"
            );
            self.release("terminal snapshot");
        } else {
            self.metrics.poll(PollOutcome::Running);
            trace!(
                operation_id = %self.operation_id,
                state = %snapshot.state_name(),
                "Operation still running"
            );
        }

        Ok(snapshot)
    }

    /// Stop the polling task and drop the stop channel.
    ///
    /// Returns `false` if an earlier call already did it.
    fn release(&self, reason: &'static str) -> bool {
        {
            let _guard = self.current.write();
            if self
                .released
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return false;
            }
        }
        #[cfg(test)]
        self.releases.fetch_add(1, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.lock().take() {
            let _ = stop_tx.send(true);
        }

        let phase = self.current().phase();
        self.metrics.tracker_released(phase.as_str());
        debug!(
            operation_id = %self.operation_id,
            reason,
            phase = phase.as_str(),
            "Tracker released"
        );
        true
    }
}

/// Client-side handle supervising one long-running remote operation.
///
/// Construction spawns a Tokio task that polls the [`OperationSource`] every
/// `poll_interval` until the operation is terminal or the tracker is
/// disposed. Fetch failures inside that task are logged and retried on the
/// next tick; only explicit calls return errors.
///
/// Dropping the handle disposes it. The remote job is never affected by
/// disposal; use [`cancel`](Self::cancel) to stop it server-side.
pub struct OperationTracker<S: OperationSnapshot> {
    shared: Arc<Shared<S>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: OperationSnapshot> OperationTracker<S> {
    /// Start tracking an operation from its initial snapshot.
    ///
    /// Must be called from within a Tokio runtime. An initial snapshot that
    /// is already terminal is released immediately and never polled. The
    /// poll interval is clamped to at least 1ms, however `config` was built.
    pub fn start(initial: S, source: Arc<dyn OperationSource<S>>, config: TrackerConfig) -> Self {
        let poll_interval = config.poll_interval;
        let config = config.with_poll_interval(poll_interval);
        let operation_id = initial.operation_id();
        let metrics = TrackerMetrics::new(S::KIND);
        let initially_terminal = initial.is_terminal();
        let (stop_tx, stop_rx) = watch::channel(false);

        info!(
            operation_id = %operation_id,
            kind = S::KIND,
            state = %initial.state_name(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Tracking operation"
        );

        let shared = Arc::new(Shared {
            operation_id,
            current: RwLock::new(Arc::new(initial)),
            source,
            config,
            metrics,
            released: AtomicBool::new(false),
            stop_tx: Mutex::new(Some(stop_tx)),
            #[cfg(test)]
            releases: std::sync::atomic::AtomicU32::new(0),
        });
        shared.metrics.tracker_started();

        let task = if initially_terminal {
            shared.release("initial snapshot is terminal");
            None
        } else {
            Some(tokio::spawn(poll_loop(Arc::clone(&shared), stop_rx)))
        };

        Self {
            shared,
            task: Mutex::new(task),
        }
    }

    /// Start tracking with plain closures for the two collaborator calls.
    pub fn from_fns<F, C>(initial: S, fetch: F, cancel: C, config: TrackerConfig) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<S, BoxError>> + Send + Sync + 'static,
        C: Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync + 'static,
    {
        Self::start(initial, Arc::new(FnSource::new(fetch, cancel)), config)
    }

    pub fn operation_id(&self) -> &str {
        &self.shared.operation_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    /// Latest known snapshot. Never waits on I/O.
    pub fn current(&self) -> Arc<S> {
        self.shared.current()
    }

    pub fn phase(&self) -> OperationPhase {
        self.current().phase()
    }

    pub fn is_completed(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn is_successful(&self) -> bool {
        self.phase().is_successful()
    }

    pub fn is_failed(&self) -> bool {
        self.phase().is_failed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase().is_cancelled()
    }

    /// Whether polling resources have been released
    pub fn is_disposed(&self) -> bool {
        self.shared.is_released()
    }

    /// Fetch the status once and make it current.
    ///
    /// Returns the current snapshot without any I/O if it is already
    /// terminal. Fetch failures are returned to the caller.
    pub async fn refresh_status(&self) -> TrackerResult<Arc<S>> {
        let current = self.current();
        if current.is_terminal() {
            return Ok(current);
        }
        if self.is_disposed() {
            return Err(self.shared.disposed_error());
        }

        self.shared.refresh().await
    }

    /// Wait until the operation is terminal.
    ///
    /// Re-reads [`current`](Self::current) every poll interval; fetching is
    /// left to the polling task. `timeout` defaults to the configured
    /// `default_timeout`. A timeout leaves both the tracker and the remote
    /// job running.
    pub async fn wait_for_completion(
        &self,
        timeout: Option<Duration>,
        signal: Option<CancelSignal>,
    ) -> TrackerResult<Arc<S>> {
        let waited = timeout.unwrap_or(self.shared.config.default_timeout);
        let deadline = Instant::now().checked_add(waited);
        let mut signal = signal;

        loop {
            let current = self.current();
            if current.is_terminal() {
                return Ok(current);
            }
            if self.is_disposed() {
                return Err(self.shared.disposed_error());
            }
            if signal.as_ref().is_some_and(CancelSignal::is_cancelled) {
                return Err(TrackerError::Interrupted {
                    operation_id: self.shared.operation_id.clone(),
                });
            }

            let mut nap = self.shared.config.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    self.shared.metrics.wait_timed_out();
                    warn!(
                        operation_id = %self.shared.operation_id,
                        state = %current.state_name(),
                        waited_ms = waited.as_millis() as u64,
                        "Timed out waiting for operation"
                    );
                    return Err(TrackerError::Timeout {
                        operation_id: self.shared.operation_id.clone(),
                        last_state: current.state_name(),
                        waited,
                    });
                }
                nap = nap.min(deadline - now);
            }

            tokio::select! {
                _ = tokio::time::sleep(nap) => {}
                _ = fired(&mut signal) => {}
            }
        }
    }

    /// Ask the server to cancel, then refresh once.
    ///
    /// The returned snapshot is whatever the server reports after the cancel
    /// request: it may still be running, or may even have succeeded if the
    /// job finished first. A tracker that is already terminal returns its
    /// snapshot without contacting the server.
    pub async fn cancel(&self, signal: Option<CancelSignal>) -> TrackerResult<Arc<S>> {
        let current = self.current();
        if current.is_terminal() {
            debug!(
                operation_id = %self.shared.operation_id,
                state = %current.state_name(),
                "Operation already finished, skipping cancel request"
            );
            return Ok(current);
        }
        if self.is_disposed() {
            return Err(self.shared.disposed_error());
        }

        let mut signal = signal;
        if signal.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Err(TrackerError::Interrupted {
                operation_id: self.shared.operation_id.clone(),
            });
        }

        info!(operation_id = %self.shared.operation_id, "Requesting operation cancellation");
        self.shared.metrics.cancel_requested();

        tokio::select! {
            result = self.shared.source.request_cancel() => {
                result.map_err(|source| TrackerError::CancelRequest {
                    operation_id: self.shared.operation_id.clone(),
                    source,
                })?;
            }
            _ = fired(&mut signal) => {
                return Err(TrackerError::Interrupted {
                    operation_id: self.shared.operation_id.clone(),
                });
            }
        }

        self.refresh_status().await
    }

    /// [`cancel`](Self::cancel) followed by
    /// [`wait_for_completion`](Self::wait_for_completion).
    ///
    /// `timeout` defaults to the configured `cancel_timeout`.
    pub async fn cancel_and_wait(
        &self,
        timeout: Option<Duration>,
        signal: Option<CancelSignal>,
    ) -> TrackerResult<Arc<S>> {
        self.cancel(signal.clone()).await?;
        let timeout = timeout.unwrap_or(self.shared.config.cancel_timeout);
        self.wait_for_completion(Some(timeout), signal).await
    }

    /// Stop polling and release the stop channel. Idempotent.
    pub fn dispose(&self) {
        self.shared.release("disposed");
    }

    /// Dispose, then wait for the polling task to exit.
    pub async fn dispose_async(&self) {
        self.dispose();

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(
                    operation_id = %self.shared.operation_id,
                    error = %e,
                    "Polling task ended abnormally"
                );
            }
        }
    }
}

impl<S: OperationSnapshot> Drop for OperationTracker<S> {
    fn drop(&mut self) {
        self.shared.release("dropped");
    }
}

impl<S: OperationSnapshot> std::fmt::Debug for OperationTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationTracker")
            .field("operation_id", &self.shared.operation_id)
            .field("current", &self.current())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Resolves once a stop is requested or the stop channel is gone
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await.map(|_| ());
}

async fn poll_loop<S: OperationSnapshot>(shared: Arc<Shared<S>>, mut stop: watch::Receiver<bool>) {
    let interval = shared.config.poll_interval;

    loop {
        if shared.is_released() || shared.current().is_terminal() {
            break;
        }

        tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let refreshed = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break,
            result = shared.refresh() => result,
        };

        match refreshed {
            Ok(snapshot) if snapshot.is_terminal() => break,
            Ok(_) => {}
            Err(TrackerError::Disposed { .. }) => break,
            Err(e) => {
                debug!(
                    operation_id = %shared.operation_id,
                    error = %e,
                    "Status poll failed, retrying on next tick"
                );
            }
        }
    }

    debug!(operation_id = %shared.operation_id, "Polling task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug, Clone, PartialEq)]
    struct Job {
        id: &'static str,
        phase: OperationPhase,
    }

    impl OperationSnapshot for Job {
        fn operation_id(&self) -> String {
            self.id.to_string()
        }

        fn phase(&self) -> OperationPhase {
            self.phase
        }

        fn state_name(&self) -> String {
            self.phase.as_str().to_string()
        }
    }

    fn job(phase: OperationPhase) -> Job {
        Job { id: "job-1", phase }
    }

    fn fast() -> TrackerConfig {
        TrackerConfig::new().with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_terminal_initial_snapshot_is_released_without_polling() {
        let fetches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fetches);

        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Succeeded),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(job(OperationPhase::Running)) })
            },
            || Box::pin(async { Ok(()) }),
            fast(),
        );

        assert!(tracker.is_disposed());
        assert!(tracker.is_successful());
        assert!(tracker.task.lock().is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        let refreshed = tracker.refresh_status().await.unwrap();
        assert!(refreshed.phase.is_successful());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_apply_keeps_terminal_snapshot() {
        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Running),
            || Box::pin(async { Ok(job(OperationPhase::Running)) }),
            || Box::pin(async { Ok(()) }),
            TrackerConfig::new().with_poll_interval(Duration::from_secs(60)),
        );

        tracker.shared.apply(job(OperationPhase::Cancelled)).unwrap();
        let after = tracker.shared.apply(job(OperationPhase::Running)).unwrap();

        assert!(after.phase.is_cancelled());
        assert!(tracker.is_cancelled());
        assert!(tracker.is_disposed());
    }

    #[tokio::test]
    async fn test_release_runs_once() {
        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Running),
            || Box::pin(async { Ok(job(OperationPhase::Running)) }),
            || Box::pin(async { Ok(()) }),
            fast(),
        );

        assert!(tracker.shared.release("first"));
        assert!(!tracker.shared.release("second"));
        assert!(tracker.shared.stop_tx.lock().is_none());
    }

    #[tokio::test]
    async fn test_disposed_tracker_rejects_late_snapshot() {
        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Running),
            || Box::pin(async { Ok(job(OperationPhase::Running)) }),
            || Box::pin(async { Ok(()) }),
            fast(),
        );

        tracker.dispose();
        let err = tracker.shared.apply(job(OperationPhase::Succeeded)).unwrap_err();

        assert!(matches!(err, TrackerError::Disposed { .. }));
        assert!(!tracker.is_completed());
    }

    fn releases<S: OperationSnapshot>(tracker: &OperationTracker<S>) -> u32 {
        tracker.shared.releases.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_release_count_survives_dispose_and_drop() {
        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Running),
            || Box::pin(async { Ok(job(OperationPhase::Running)) }),
            || Box::pin(async { Ok(()) }),
            fast(),
        );
        let shared = Arc::clone(&tracker.shared);

        tracker.dispose();
        tracker.dispose_async().await;
        drop(tracker);

        assert_eq!(shared.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_refreshes_and_poll_loop_release_once() {
        let fetches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fetches);

        let tracker = Arc::new(OperationTracker::from_fns(
            job(OperationPhase::Running),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(job(OperationPhase::Succeeded))
                })
            },
            || Box::pin(async { Ok(()) }),
            TrackerConfig::new().with_poll_interval(Duration::from_millis(5)),
        ));

        // Let the polling task start its own fetch before the manual ones
        tokio::time::sleep(Duration::from_millis(7)).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = Arc::clone(&tracker);
            let handle = tokio::spawn(async move { tracker.refresh_status().await });
            handles.push(handle);
        }
        for handle in handles {
            let snapshot = handle.await.unwrap().unwrap();
            assert!(snapshot.phase.is_successful());
        }

        assert!(fetches.load(Ordering::SeqCst) >= 1);
        assert!(tracker.is_disposed());
        assert_eq!(releases(&tracker), 1);

        tracker.dispose();
        tracker.dispose_async().await;
        assert_eq!(releases(&tracker), 1);
    }

    #[tokio::test]
    async fn test_start_clamps_zero_poll_interval() {
        let config = TrackerConfig {
            poll_interval: Duration::ZERO,
            ..TrackerConfig::default()
        };

        let tracker = OperationTracker::from_fns(
            job(OperationPhase::Running),
            || Box::pin(async { Ok(job(OperationPhase::Running)) }),
            || Box::pin(async { Ok(()) }),
            config,
        );

        assert_eq!(tracker.config().poll_interval, Duration::from_millis(1));
        tracker.dispose_async().await;
    }
}
