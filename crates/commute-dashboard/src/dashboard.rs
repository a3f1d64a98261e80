use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use commute_core::{ApiKeyResolver, AppError, Config, KeySource, LineConfig, SettingsProvider};
use tokio::sync::mpsc;

use crate::command::{Command, LineId, HELP};
use crate::panel::Panel;
use crate::poller::DashboardEvent;
use crate::qr::QrOverlay;
use crate::render::{render_transit, render_weather};
use crate::source::{PanelKind, TransitSource, WeatherSource};
use crate::state::FetchStatus;
use crate::theme::{Palette, Theme};

/// Whether the front end should keep running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Both panels plus the screen-level state: theme, QR overlay and the
/// status line.
pub struct Dashboard {
    config: Config,
    settings: Arc<dyn SettingsProvider>,
    api_key: ApiKeyResolver,
    transit: Panel<TransitSource>,
    weather: Panel<WeatherSource>,
    theme: Theme,
    overlay: Option<QrOverlay>,
    status: Option<String>,
    events_tx: mpsc::UnboundedSender<DashboardEvent>,
    events_rx: mpsc::UnboundedReceiver<DashboardEvent>,
}

fn period(seconds: u64) -> Duration {
    // tokio intervals reject a zero period
    Duration::from_secs(seconds.max(1))
}

/// Where to get a 511.org key
pub const API_KEY_HINT: &str = "Get a free key at https://511.org/open-data/token";

/// Description of where the transit API key comes from. A missing key
/// adds a second line pointing at the token page.
pub fn api_key_status(resolver: &ApiKeyResolver) -> String {
    match resolver.key_source() {
        KeySource::Settings => format!(
            "API key: stored in {} (live data)",
            resolver.store().describe()
        ),
        KeySource::Default => "API key: using built-in default (live data)".to_string(),
        KeySource::Missing => format!("API key: not set (demo mode)\n{}", API_KEY_HINT),
    }
}

impl Dashboard {
    pub fn new(config: Config, settings: Arc<dyn SettingsProvider>) -> Result<Self, AppError> {
        let api_key = ApiKeyResolver::new(
            Arc::clone(&settings),
            config.transit.default_api_key.clone(),
        );
        Self::with_api_key(config, settings, api_key)
    }

    /// Build with an explicit key resolver instead of the default lookup.
    pub fn with_api_key(
        config: Config,
        settings: Arc<dyn SettingsProvider>,
        api_key: ApiKeyResolver,
    ) -> Result<Self, AppError> {
        let transit = Panel::new(
            TransitSource::from_config(&config, api_key.clone())?,
            period(config.transit.refresh_seconds),
        );
        let weather = Panel::new(
            WeatherSource::from_config(&config)?,
            period(config.weather.refresh_seconds),
        );
        let theme = Theme::load(settings.as_ref(), config.ui.dark_mode);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            settings,
            api_key,
            transit,
            weather,
            theme,
            overlay: None,
            status: None,
            events_tx,
            events_rx,
        })
    }

    /// Mount both panels; each fetches immediately and then on its timer.
    pub fn start(&mut self) {
        self.transit.mount(self.events_tx.clone());
        self.weather.mount(self.events_tx.clone());
    }

    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        self.events_rx.recv().await
    }

    pub async fn shutdown(&mut self) {
        self.transit.unmount().await;
        self.weather.unmount().await;
    }

    pub fn transit(&self) -> &Panel<TransitSource> {
        &self.transit
    }

    pub fn weather(&self) -> &Panel<WeatherSource> {
        &self.weather
    }

    pub fn panel_status(&self, kind: PanelKind) -> FetchStatus {
        match kind {
            PanelKind::Transit => self.transit.snapshot().status(),
            PanelKind::Weather => self.weather.snapshot().status(),
        }
    }

    /// Whether `event` warrants a redraw. Plain output is append-only, so
    /// it only prints panels that have finished a cycle.
    pub fn needs_redraw(&self, event: DashboardEvent, plain: bool) -> bool {
        if !plain {
            return true;
        }
        let DashboardEvent::PanelUpdated(kind) = event;
        matches!(
            self.panel_status(kind),
            FetchStatus::Success | FetchStatus::Error
        )
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn overlay(&self) -> Option<&QrOverlay> {
        self.overlay.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn line(&self, id: LineId) -> &LineConfig {
        match id {
            LineId::MLine => &self.config.transit.m_line,
            LineId::Bus29 => &self.config.transit.bus_29,
        }
    }

    /// Parse and apply one line of user input.
    pub fn handle_input(&mut self, input: &str) -> Flow {
        match input.parse::<Command>() {
            Ok(command) => self.handle(command),
            Err(e) => {
                self.status = Some(e.to_string());
                Flow::Continue
            }
        }
    }

    pub fn handle(&mut self, command: Command) -> Flow {
        self.status = None;
        match command {
            Command::Refresh => {
                self.transit.refresh();
                self.weather.refresh();
            }
            Command::ToggleTheme => {
                self.theme = self.theme.toggled();
                if let Err(e) = self.theme.save(self.settings.as_ref()) {
                    tracing::warn!("Failed to save theme: {}", e);
                    self.status = Some(format!("Theme not saved: {}", e.user_message()));
                }
            }
            Command::ShowQr(id) => match QrOverlay::for_line(self.line(id)) {
                Ok(overlay) => self.overlay = Some(overlay),
                Err(e) => {
                    tracing::error!("Failed to render QR code for line {}: {}", id, e);
                    self.status = Some(format!("Could not render QR code: {}", e));
                }
            },
            Command::CloseOverlay => self.overlay = None,
            Command::SettingsStatus => self.status = Some(api_key_status(&self.api_key)),
            Command::Help => self.status = Some(HELP.to_string()),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Full screen. The QR overlay, when open, replaces the panels.
    pub fn render(&self, palette: Option<Palette>) -> String {
        let p = palette.unwrap_or_else(|| self.theme.palette());
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{}commute{}  {}[t] {}  [s] settings  [h] help  [q] quit{}",
            p.heading,
            p.reset,
            p.muted,
            self.theme.toggle_glyph(),
            p.reset
        );
        if let Some(status) = &self.status {
            let _ = writeln!(out, "{}{}{}", p.notice, status, p.reset);
        }
        out.push('\n');

        if let Some(overlay) = &self.overlay {
            out.push_str(&overlay.render());
            out.push('\n');
            return out;
        }

        out.push_str(&render_transit(
            &self.transit.snapshot(),
            &self.config.transit.m_line,
            &self.config.transit.bus_29,
            p,
        ));
        out.push('\n');
        out.push_str(&render_weather(
            &self.weather.snapshot(),
            &self.config.weather.location_label,
            p,
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_core::{MemorySettingsStore, THEME_SETTING};

    use crate::theme::PLAIN;

    fn dashboard() -> (Dashboard, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemorySettingsStore::new());
        let api_key = ApiKeyResolver::without_build_default(store.clone(), None);
        let dashboard = Dashboard::with_api_key(Config::default(), store.clone(), api_key).unwrap();
        (dashboard, store)
    }

    #[test]
    fn test_theme_toggle_persists() {
        let (mut dashboard, store) = dashboard();
        assert_eq!(dashboard.theme(), Theme::Light);

        assert_eq!(dashboard.handle(Command::ToggleTheme), Flow::Continue);
        assert_eq!(dashboard.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_SETTING).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_qr_overlay_open_and_close() {
        let (mut dashboard, _) = dashboard();

        dashboard.handle(Command::ShowQr(LineId::Bus29));
        let overlay = dashboard.overlay().unwrap();
        assert_eq!(overlay.title, "29 Bus Stop");
        assert!(dashboard.render(Some(PLAIN)).contains("29 Bus Stop"));
        assert!(!dashboard.render(Some(PLAIN)).contains("5-Day Forecast"));

        dashboard.handle(Command::CloseOverlay);
        assert!(dashboard.overlay().is_none());
        assert!(dashboard.render(Some(PLAIN)).contains("5-Day Forecast"));
    }

    #[test]
    fn test_input_errors_go_to_status() {
        let (mut dashboard, _) = dashboard();
        assert_eq!(dashboard.handle_input("qr 99"), Flow::Continue);
        assert!(dashboard.status().unwrap_or_default().contains("99"));

        dashboard.handle(Command::CloseOverlay);
        assert!(dashboard.status().is_none());
    }

    #[test]
    fn test_settings_status() {
        let (mut dashboard, store) = dashboard();
        store.set(commute_core::API_KEY_SETTING, "abc").unwrap();
        dashboard.handle(Command::SettingsStatus);
        assert_eq!(
            dashboard.status(),
            Some("API key: stored in memory (live data)")
        );
    }

    #[test]
    fn test_missing_key_status_links_token_page() {
        let (mut dashboard, _) = dashboard();
        dashboard.handle(Command::SettingsStatus);
        let status = dashboard.status().unwrap();
        assert!(status.starts_with("API key: not set (demo mode)"));
        assert!(status.contains("https://511.org/open-data/token"));
    }

    #[test]
    fn test_plain_redraw_waits_for_finished_cycle() {
        let (dashboard, _) = dashboard();
        let event = DashboardEvent::PanelUpdated(PanelKind::Transit);
        assert_eq!(dashboard.panel_status(PanelKind::Transit), FetchStatus::Idle);
        assert!(dashboard.needs_redraw(event, false));
        assert!(!dashboard.needs_redraw(event, true));
    }

    #[tokio::test]
    async fn test_plain_redraw_after_demo_cycle() {
        let mut config = Config::default();
        config.transit.demo_delay_ms = 10;
        config.weather.api_base_url = "http://127.0.0.1:9".to_string();
        let store = Arc::new(MemorySettingsStore::new());
        let api_key = ApiKeyResolver::without_build_default(store.clone(), None);
        let mut dashboard = Dashboard::with_api_key(config, store, api_key).unwrap();
        dashboard.start();
        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match dashboard.next_event().await {
                    Some(event @ DashboardEvent::PanelUpdated(PanelKind::Transit))
                        if dashboard.needs_redraw(event, true) =>
                    {
                        break true
                    }
                    Some(_) => continue,
                    None => break false,
                }
            }
        })
        .await;
        assert_eq!(finished.ok(), Some(true));
        assert_eq!(
            dashboard.panel_status(PanelKind::Transit),
            FetchStatus::Success
        );
        dashboard.shutdown().await;
    }

    #[test]
    fn test_quit() {
        let (mut dashboard, _) = dashboard();
        assert_eq!(dashboard.handle_input("q"), Flow::Quit);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        assert_eq!(period(0), Duration::from_secs(1));
        assert_eq!(period(30), Duration::from_secs(30));
    }
}
