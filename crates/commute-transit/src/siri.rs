//! Subset of the SIRI StopMonitoring JSON returned by 511.org.
//!
//! Every level is optional: the feed omits whole branches when a stop has
//! no upcoming visits, and some fields come back as `null`.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopMonitoringResponse {
    pub service_delivery: Option<ServiceDelivery>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceDelivery {
    pub response_timestamp: Option<String>,
    pub stop_monitoring_delivery: Option<StopMonitoringDelivery>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopMonitoringDelivery {
    pub monitored_stop_visit: Option<Vec<MonitoredStopVisit>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredStopVisit {
    pub monitoring_ref: Option<String>,
    pub monitored_vehicle_journey: Option<MonitoredVehicleJourney>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredVehicleJourney {
    pub line_ref: Option<String>,
    pub published_line_name: Option<String>,
    pub destination_name: Option<String>,
    pub monitored_call: Option<MonitoredCall>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredCall {
    pub expected_arrival_time: Option<String>,
    pub aimed_arrival_time: Option<String>,
}

impl StopMonitoringResponse {
    /// The visit list, or an empty slice when any level is missing.
    pub fn visits(&self) -> &[MonitoredStopVisit] {
        self.service_delivery
            .as_ref()
            .and_then(|d| d.stop_monitoring_delivery.as_ref())
            .and_then(|d| d.monitored_stop_visit.as_deref())
            .unwrap_or(&[])
    }
}

impl MonitoredCall {
    /// Expected arrival, falling back to the scheduled (aimed) arrival.
    /// Blank strings count as missing.
    pub fn arrival_time(&self) -> Option<&str> {
        non_blank(&self.expected_arrival_time).or_else(|| non_blank(&self.aimed_arrival_time))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
