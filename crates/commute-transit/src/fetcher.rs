use std::time::Duration;

use chrono::Utc;
use commute_core::{LineConfig, TransitConfig};

use crate::client::TransitClient;
use crate::demo::demo_predictions;
use crate::predictions::parse_predictions;
use crate::types::{Prediction, TransitError, TransitSnapshot};

/// Produces arrival predictions for the two monitored lines.
#[derive(Debug, Clone)]
pub struct TransitFetcher {
    client: TransitClient,
    agency: String,
    m_line: LineConfig,
    bus_29: LineConfig,
    demo_delay: Duration,
}

impl TransitFetcher {
    pub fn new(config: &TransitConfig) -> Result<Self, TransitError> {
        let client = TransitClient::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )?;

        Ok(Self {
            client,
            agency: config.agency.clone(),
            m_line: config.m_line.clone(),
            bus_29: config.bus_29.clone(),
            demo_delay: Duration::from_millis(config.demo_delay_ms),
        })
    }

    /// Fetch predictions for both lines.
    ///
    /// Without an API key this waits for the demo delay and returns synthetic
    /// data with `demo_mode` set. With a key, both stops are queried
    /// concurrently; a body that cannot be parsed leaves that line empty
    /// without affecting the other.
    pub async fn fetch_predictions(
        &self,
        api_key: Option<&str>,
    ) -> Result<TransitSnapshot, TransitError> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());

        let Some(api_key) = api_key else {
            tracing::debug!("No transit API key configured, using demo data");
            tokio::time::sleep(self.demo_delay).await;
            return Ok(self.demo_snapshot());
        };

        let (m_line, bus_29) = tokio::join!(
            self.fetch_line(api_key, &self.m_line),
            self.fetch_line(api_key, &self.bus_29),
        );

        let snapshot = TransitSnapshot {
            m_line: m_line?,
            bus_29: bus_29?,
            demo_mode: false,
        };

        tracing::info!(
            "Fetched {} {} and {} {} predictions",
            snapshot.m_line.len(),
            self.m_line.label,
            snapshot.bus_29.len(),
            self.bus_29.label
        );
        Ok(snapshot)
    }

    async fn fetch_line(
        &self,
        api_key: &str,
        line: &LineConfig,
    ) -> Result<Vec<Prediction>, TransitError> {
        let body = self
            .client
            .stop_monitoring(api_key, &self.agency, &line.stop_code)
            .await?;

        match parse_predictions(&body, line, Utc::now()) {
            Ok(predictions) => Ok(predictions),
            Err(e) => {
                tracing::warn!("Error parsing {} predictions: {}", line.label, e);
                Ok(Vec::new())
            }
        }
    }

    fn demo_snapshot(&self) -> TransitSnapshot {
        let mut rng = rand::rng();
        TransitSnapshot {
            m_line: demo_predictions(&self.m_line, &mut rng),
            bus_29: demo_predictions(&self.bus_29, &mut rng),
            demo_mode: true,
        }
    }
}
