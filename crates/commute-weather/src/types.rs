use chrono::{DateTime, FixedOffset};
use commute_core::{AppError, NetworkError, ReqwestErrorExt};
use serde::{Deserialize, Serialize};

/// Weather condition categories recognized in NWS short forecasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherCondition {
    PartlyCloudy,
    Clear,
    Cloudy,
    Rain,
    Thunderstorm,
    Snow,
    Fog,
    Wind,
    #[default]
    Unknown,
}

/// Ordered keyword rules; the first rule with a matching keyword wins.
///
/// The partly rule sits ahead of the clear rule because "Partly Sunny" and
/// "Mostly Sunny" also contain "sunny".
const CONDITION_RULES: &[(&[&str], WeatherCondition)] = &[
    (
        &["partly cloudy", "partly sunny", "mostly sunny"],
        WeatherCondition::PartlyCloudy,
    ),
    (&["sunny", "clear"], WeatherCondition::Clear),
    (&["cloudy", "overcast"], WeatherCondition::Cloudy),
    (&["rain", "showers"], WeatherCondition::Rain),
    (&["storm", "thunder"], WeatherCondition::Thunderstorm),
    (&["snow"], WeatherCondition::Snow),
    (&["fog"], WeatherCondition::Fog),
    (&["wind"], WeatherCondition::Wind),
];

impl WeatherCondition {
    /// Classify an NWS `shortForecast` such as "Chance Light Rain".
    pub fn from_forecast_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        CONDITION_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, condition)| *condition)
            .unwrap_or_default()
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::PartlyCloudy => "⛅",
            Self::Clear => "☀️",
            Self::Cloudy => "☁️",
            Self::Rain => "🌧️",
            Self::Thunderstorm => "⛈️",
            Self::Snow => "❄️",
            Self::Fog => "🌫️",
            Self::Wind => "💨",
            Self::Unknown => "🌤️",
        }
    }
}

/// Glyph for a forecast text, e.g. "Heavy Rain" -> 🌧️
pub fn condition_glyph(text: &str) -> &'static str {
    WeatherCondition::from_forecast_text(text).glyph()
}

/// One NWS forecast period (a day or a night)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub is_daytime: Option<bool>,
    pub temperature: i32,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    pub short_forecast: String,
}

/// One day of the 5-day summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// e.g. "Oct 19"
    pub date: String,
    /// e.g. "Mon"
    pub weekday_label: String,
    pub high_temp: i32,
    pub low_temp: i32,
    pub condition_text: String,
    pub icon_glyph: String,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No forecast available for {0}")]
    NoForecastUrl(String),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        use commute_core::WeatherError as Shown;
        match e {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Status { status: 404, url } => {
                AppError::Weather(Shown::LocationNotFound(url))
            }
            WeatherError::Status { status, .. } if status >= 500 => {
                AppError::Weather(Shown::ServiceUnavailable)
            }
            WeatherError::Status { status, url } => {
                AppError::Weather(Shown::ApiError(format!("HTTP {} from {}", status, url)))
            }
            WeatherError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
            WeatherError::NoForecastUrl(s) => AppError::Weather(Shown::LocationNotFound(s)),
        }
    }
}
