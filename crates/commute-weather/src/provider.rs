use std::sync::Arc;
use std::time::Duration;

use commute_core::WeatherConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::reduce::reduce_periods;
use crate::types::{ForecastDay, ForecastPeriod, WeatherError};

const ACCEPT: &str = "application/geo+json";

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

/// Fetches the forecast for one fixed coordinate.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            latitude: config.latitude,
            longitude: config.longitude,
        })
    }

    /// URL of the grid lookup for the configured coordinate
    pub fn points_url(&self) -> String {
        format!(
            "{}/points/{:.4},{:.4}",
            self.base_url, self.latitude, self.longitude
        )
    }

    /// Resolve the forecast endpoint, fetch its periods and reduce them to
    /// at most five days.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self) -> Result<Vec<ForecastDay>, WeatherError> {
        let points_url = self.points_url();
        let points: PointsResponse = self.get_json(&points_url).await?;

        let forecast_url = points
            .properties
            .forecast
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                WeatherError::NoForecastUrl(format!("{:.4},{:.4}", self.latitude, self.longitude))
            })?;

        let forecast: ForecastResponse = self.get_json(&forecast_url).await?;
        let days = reduce_periods(&forecast.properties.periods);

        tracing::info!(
            "Weather forecast fetched: {} periods, {} days",
            forecast.properties.periods.len(),
            days.len()
        );
        Ok(days)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(format!("{}: {}", url, e)))
    }
}
