use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

/// Panel state shared between a poller and the renderer
pub type SharedState<T> = Arc<Mutex<PanelState<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Informational, e.g. demo mode
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelMessage {
    pub kind: MessageKind,
    pub text: String,
}

/// Data, status and message of one panel.
///
/// Every fetch cycle takes a sequence number from [`PanelState::begin_cycle`].
/// A completion is applied only while its number is still the latest one
/// issued, so a slow cycle can never overwrite a newer result.
#[derive(Debug, Clone)]
pub struct PanelState<T> {
    status: FetchStatus,
    data: Option<T>,
    message: Option<PanelMessage>,
    last_updated: Option<DateTime<Local>>,
    latest_cycle: u64,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            data: None,
            message: None,
            last_updated: None,
            latest_cycle: 0,
        }
    }
}

impl<T> PanelState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedState<T> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Start a cycle and return its sequence number.
    ///
    /// Data and message stay in place until the cycle resolves.
    pub fn begin_cycle(&mut self) -> u64 {
        self.latest_cycle += 1;
        self.status = FetchStatus::Loading;
        self.latest_cycle
    }

    pub fn is_latest(&self, cycle: u64) -> bool {
        cycle == self.latest_cycle
    }

    /// Apply a successful result. Returns false if the cycle was superseded.
    pub fn complete(&mut self, cycle: u64, data: T, notice: Option<String>) -> bool {
        if !self.is_latest(cycle) {
            return false;
        }
        self.status = FetchStatus::Success;
        self.data = Some(data);
        self.message = notice.map(|text| PanelMessage {
            kind: MessageKind::Notice,
            text,
        });
        self.last_updated = Some(Local::now());
        true
    }

    /// Apply a failure. Previous data is kept so the panel can keep showing it.
    pub fn fail(&mut self, cycle: u64, text: String) -> bool {
        if !self.is_latest(cycle) {
            return false;
        }
        self.status = FetchStatus::Error;
        self.message = Some(PanelMessage {
            kind: MessageKind::Error,
            text,
        });
        true
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn message(&self) -> Option<&PanelMessage> {
        self.message.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn latest_cycle(&self) -> u64 {
        self.latest_cycle
    }
}
