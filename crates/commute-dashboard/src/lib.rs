//! Panels, polling and text rendering for the commute dashboard.

pub mod command;
pub mod dashboard;
pub mod panel;
pub mod poller;
pub mod qr;
pub mod render;
pub mod source;
pub mod state;
pub mod theme;

pub use command::{Command, CommandError, LineId};
pub use dashboard::{api_key_status, Dashboard, Flow, API_KEY_HINT};
pub use panel::Panel;
pub use poller::{DashboardEvent, PollHandle};
pub use qr::{render_qr, QrOverlay};
pub use source::{PanelKind, PanelSource, TransitSource, WeatherSource};
pub use state::{FetchStatus, MessageKind, PanelMessage, PanelState, SharedState};
pub use theme::{Palette, Theme};
