//! 511.org transit API client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::instrument;

use crate::types::TransitError;

pub const TRANSIT_API_BASE: &str = "https://api.511.org/transit";

#[derive(Debug, Clone)]
pub struct TransitClient {
    client: Client,
    base_url: String,
}

impl TransitClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransitError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the raw StopMonitoring body for one stop.
    ///
    /// The body is returned unparsed so a malformed document can be handled
    /// per stop by the caller.
    #[instrument(skip(self, api_key), level = "debug")]
    pub async fn stop_monitoring(
        &self,
        api_key: &str,
        agency: &str,
        stop_code: &str,
    ) -> Result<String, TransitError> {
        let url = format!("{}/StopMonitoring", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("agency", agency),
                ("stopCode", stop_code),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransitError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}
