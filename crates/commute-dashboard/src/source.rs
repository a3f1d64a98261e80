//! Data sources behind the dashboard panels.
//!
//! A [`PanelSource`] performs one fetch cycle and reports failures as
//! [`AppError`] so the panel can show a user-facing hint.

use std::fmt;
use std::future::Future;

use commute_core::{ApiKeyResolver, AppError, Config};
use commute_transit::{TransitFetcher, TransitSnapshot};
use commute_weather::{ForecastDay, WeatherProvider};

/// Shown in place of an error while transit data is synthetic
pub const DEMO_NOTICE: &str = "Demo Mode - Configure API key in settings to use live data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Transit,
    Weather,
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelKind::Transit => write!(f, "transit"),
            PanelKind::Weather => write!(f, "weather"),
        }
    }
}

pub trait PanelSource: Send + Sync + 'static {
    type Data: Clone + Send + 'static;

    const KIND: PanelKind;

    /// First sentence of every error message shown in the panel
    const FAILURE_HEADLINE: &'static str;

    fn load(&self) -> impl Future<Output = Result<Self::Data, AppError>> + Send;

    /// Informational message to show alongside successfully loaded data
    fn notice(_data: &Self::Data) -> Option<String> {
        None
    }
}

/// Transit predictions for both monitored lines
pub struct TransitSource {
    fetcher: TransitFetcher,
    api_key: ApiKeyResolver,
}

impl TransitSource {
    pub fn new(fetcher: TransitFetcher, api_key: ApiKeyResolver) -> Self {
        Self { fetcher, api_key }
    }

    pub fn from_config(config: &Config, api_key: ApiKeyResolver) -> Result<Self, AppError> {
        let fetcher = TransitFetcher::new(&config.transit)?;
        Ok(Self::new(fetcher, api_key))
    }
}

impl PanelSource for TransitSource {
    type Data = TransitSnapshot;

    const KIND: PanelKind = PanelKind::Transit;
    const FAILURE_HEADLINE: &'static str = "Failed to fetch transit data.";

    async fn load(&self) -> Result<TransitSnapshot, AppError> {
        // Read per cycle so a key saved while running takes effect
        let key = self.api_key.resolve();
        Ok(self.fetcher.fetch_predictions(key.as_deref()).await?)
    }

    fn notice(data: &TransitSnapshot) -> Option<String> {
        data.demo_mode.then(|| DEMO_NOTICE.to_string())
    }
}

/// Five-day forecast for the configured location
pub struct WeatherSource {
    provider: WeatherProvider,
}

impl WeatherSource {
    pub fn new(provider: WeatherProvider) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(WeatherProvider::new(&config.weather)?))
    }
}

impl PanelSource for WeatherSource {
    type Data = Vec<ForecastDay>;

    const KIND: PanelKind = PanelKind::Weather;
    const FAILURE_HEADLINE: &'static str = "Failed to fetch weather data.";

    async fn load(&self) -> Result<Vec<ForecastDay>, AppError> {
        Ok(self.provider.fetch_forecast().await?)
    }
}

/// Message shown when a cycle fails
pub fn failure_message<S: PanelSource>(error: &AppError) -> String {
    format!("{} {}", S::FAILURE_HEADLINE, error.user_message())
}
