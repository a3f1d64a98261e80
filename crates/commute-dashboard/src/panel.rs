use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::poller::{spawn_poller, DashboardEvent, PollHandle};
use crate::source::PanelSource;
use crate::state::{PanelState, SharedState};

/// A data source, its state and (while mounted) its poll loop.
pub struct Panel<S: PanelSource> {
    source: Arc<S>,
    state: SharedState<S::Data>,
    period: Duration,
    poller: Option<PollHandle>,
}

impl<S: PanelSource> Panel<S> {
    pub fn new(source: S, period: Duration) -> Self {
        Self {
            source: Arc::new(source),
            state: PanelState::shared(),
            period,
            poller: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.poller.as_ref().is_some_and(PollHandle::is_running)
    }

    /// Start polling. Mounting an already mounted panel restarts its loop.
    pub fn mount(&mut self, events: mpsc::UnboundedSender<DashboardEvent>) {
        tracing::info!(
            "Mounting {} panel (refresh every {}s)",
            S::KIND,
            self.period.as_secs()
        );
        self.poller = Some(spawn_poller(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            self.period,
            events,
        ));
    }

    /// Trigger a cycle now. Ignored while unmounted.
    pub fn refresh(&self) {
        match &self.poller {
            Some(poller) if poller.refresh() => {}
            _ => tracing::debug!("Refresh ignored: {} panel not mounted", S::KIND),
        }
    }

    pub async fn unmount(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
            tracing::info!("Unmounted {} panel", S::KIND);
        }
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> PanelState<S::Data> {
        self.state.lock().clone()
    }
}
