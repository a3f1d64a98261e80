//! Turn a stop-monitoring response into display-ready predictions.

use chrono::{DateTime, NaiveDateTime, Utc};
use commute_core::LineConfig;

use crate::siri::{MonitoredStopVisit, StopMonitoringResponse};
use crate::types::{Prediction, TransitError, MAX_PREDICTIONS};

const UNKNOWN_DIRECTION: &str = "Unknown";

/// Parse a raw StopMonitoring body and extract predictions for `line`.
///
/// 511.org prefixes its JSON with a UTF-8 byte order mark, which is skipped.
pub fn parse_predictions(
    body: &str,
    line: &LineConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Prediction>, TransitError> {
    let body = body.trim_start_matches('\u{feff}');
    let response: StopMonitoringResponse =
        serde_json::from_str(body).map_err(|e| TransitError::Parse(e.to_string()))?;
    Ok(extract_predictions(&response, line, now))
}

/// Keep the visits whose line reference contains the route token and map
/// the first three to predictions.
pub fn extract_predictions(
    response: &StopMonitoringResponse,
    line: &LineConfig,
    now: DateTime<Utc>,
) -> Vec<Prediction> {
    response
        .visits()
        .iter()
        .filter(|visit| serves_route(visit, &line.route_token))
        .filter_map(|visit| to_prediction(visit, line, now))
        .take(MAX_PREDICTIONS)
        .collect()
}

fn serves_route(visit: &MonitoredStopVisit, route_token: &str) -> bool {
    visit
        .monitored_vehicle_journey
        .as_ref()
        .and_then(|journey| journey.line_ref.as_deref())
        .is_some_and(|line_ref| line_ref.contains(route_token))
}

fn to_prediction(
    visit: &MonitoredStopVisit,
    line: &LineConfig,
    now: DateTime<Utc>,
) -> Option<Prediction> {
    let journey = visit.monitored_vehicle_journey.as_ref()?;
    let raw_time = journey.monitored_call.as_ref()?.arrival_time()?;

    let arrival = match parse_timestamp(raw_time) {
        Some(t) => t,
        None => {
            tracing::debug!("Skipping visit with unparseable arrival time {:?}", raw_time);
            return None;
        }
    };

    Some(Prediction {
        stop_identifier: visit
            .monitoring_ref
            .clone()
            .unwrap_or_else(|| line.stop_code.clone()),
        route_label: journey
            .published_line_name
            .clone()
            .unwrap_or_else(|| line.route_token.clone()),
        minutes_until_arrival: minutes_until(arrival, now),
        direction: journey
            .destination_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_DIRECTION.to_string()),
    })
}

/// Whole minutes from `now` until `arrival`, floored and clamped at zero.
pub fn minutes_until(arrival: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let minutes = (arrival - now).num_milliseconds().div_euclid(60_000).max(0);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    // Some feeds drop the offset; those timestamps are UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}
