//! Periodic fetch loop for one panel.
//!
//! The loop runs on its own task: it starts a cycle on every interval tick
//! (the first tick fires immediately, which is the mount fetch) and on every
//! manual refresh request. Cycles run on separate tasks so a slow response
//! never delays the next tick; the panel state discards whichever cycle
//! finishes out of order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::source::{failure_message, PanelKind, PanelSource};
use crate::state::SharedState;

/// Notification that a panel's state changed and should be redrawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardEvent {
    PanelUpdated(PanelKind),
}

/// Owner of a running poll loop. Dropping the handle stops the loop and
/// abandons any cycle still in flight.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    refresh_tx: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Request an immediate cycle. Returns false once the loop has stopped.
    pub fn refresh(&self) -> bool {
        !self.cancel.is_cancelled() && self.refresh_tx.send(()).is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poll task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the poll loop for `source`, updating `state` and announcing every
/// change on `events`.
pub fn spawn_poller<S: PanelSource>(
    source: Arc<S>,
    state: SharedState<S::Data>,
    period: Duration,
    events: mpsc::UnboundedSender<DashboardEvent>,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();
    let loop_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = loop_cancel.cancelled() => break,
                _ = ticker.tick() => {
                    start_cycle(&source, &state, &events, &loop_cancel);
                }
                Some(()) = refresh_rx.recv() => {
                    tracing::debug!("Manual {} refresh", S::KIND);
                    start_cycle(&source, &state, &events, &loop_cancel);
                }
            }
        }

        tracing::debug!("{} poller stopped", S::KIND);
    });

    PollHandle {
        cancel,
        refresh_tx,
        task: Some(task),
    }
}

fn start_cycle<S: PanelSource>(
    source: &Arc<S>,
    state: &SharedState<S::Data>,
    events: &mpsc::UnboundedSender<DashboardEvent>,
    cancel: &CancellationToken,
) {
    let cycle = state.lock().begin_cycle();
    let _ = events.send(DashboardEvent::PanelUpdated(S::KIND));

    let source = Arc::clone(source);
    let state = Arc::clone(state);
    let events = events.clone();
    let cancel = cancel.clone();

    tokio::spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = source.load() => result,
        };

        let applied = {
            let mut guard = state.lock();
            match result {
                Ok(data) => {
                    let notice = S::notice(&data);
                    guard.complete(cycle, data, notice)
                }
                Err(e) => {
                    tracing::error!("Failed to fetch {} data: {}", S::KIND, e);
                    guard.fail(cycle, failure_message::<S>(&e))
                }
            }
        };

        if applied {
            let _ = events.send(DashboardEvent::PanelUpdated(S::KIND));
        } else {
            tracing::debug!("Discarding stale {} cycle {}", S::KIND, cycle);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use commute_core::{AppError, NetworkError};

    use crate::state::{FetchStatus, PanelState};

    /// Counts calls; odd calls are slow, failing calls return a timeout
    struct CountingSource {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail,
            })
        }
    }

    impl PanelSource for CountingSource {
        type Data = u32;

        const KIND: PanelKind = PanelKind::Weather;
        const FAILURE_HEADLINE: &'static str = "Failed to fetch weather data.";

        async fn load(&self) -> Result<u32, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AppError::Network(NetworkError::Timeout));
            }
            if call % 2 == 1 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(call)
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_immediately() {
        let source = CountingSource::new(false);
        let state = PanelState::shared();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(Arc::clone(&source), Arc::clone(&state), Duration::from_secs(30), tx);
        settle().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.lock().status(), FetchStatus::Loading);
        assert_eq!(rx.recv().await, Some(DashboardEvent::PanelUpdated(PanelKind::Weather)));

        tokio::time::sleep(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(state.lock().status(), FetchStatus::Success);
        assert_eq!(state.lock().data(), Some(&1));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_repeats() {
        let source = CountingSource::new(false);
        let state = PanelState::shared();
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(Arc::clone(&source), state, Duration::from_secs(30), tx);
        settle().await;
        tokio::time::sleep(Duration::from_secs(61)).await;
        settle().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cycle_does_not_overwrite_newer() {
        let source = CountingSource::new(false);
        let state = PanelState::shared();
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(Arc::clone(&source), Arc::clone(&state), Duration::from_secs(600), tx);
        settle().await;

        // Call 1 is slow; call 2 (manual refresh) answers at once
        assert!(handle.refresh());
        settle().await;
        assert_eq!(state.lock().data(), Some(&2));

        tokio::time::sleep(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(state.lock().data(), Some(&2));
        assert_eq!(state.lock().latest_cycle(), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_message() {
        let source = CountingSource::new(true);
        let state = PanelState::shared();
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(source, Arc::clone(&state), Duration::from_secs(600), tx);
        settle().await;

        let guard = state.lock();
        assert_eq!(guard.status(), FetchStatus::Error);
        let message = guard.message().map(|m| m.text.clone()).unwrap_or_default();
        assert!(message.starts_with("Failed to fetch weather data."));
        drop(guard);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_cycle() {
        let source = CountingSource::new(false);
        let state = PanelState::shared();
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(Arc::clone(&source), Arc::clone(&state), Duration::from_secs(30), tx);
        settle().await;
        handle.shutdown().await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.lock().status(), FetchStatus::Loading);
        assert!(state.lock().data().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_loop() {
        let source = CountingSource::new(false);
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(Arc::clone(&source), PanelState::shared(), Duration::from_secs(30), tx);
        settle().await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
