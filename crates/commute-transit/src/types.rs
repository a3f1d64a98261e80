use commute_core::{AppError, NetworkError, ReqwestErrorExt};
use serde::{Deserialize, Serialize};

/// Maximum predictions kept per monitored line
pub const MAX_PREDICTIONS: usize = 3;

/// One upcoming arrival at a monitored stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub stop_identifier: String,
    pub route_label: String,
    pub minutes_until_arrival: u32,
    pub direction: String,
}

impl Prediction {
    /// "Arriving" for zero minutes, otherwise "N min"
    pub fn arrival_label(&self) -> String {
        if self.minutes_until_arrival == 0 {
            "Arriving".to_string()
        } else {
            format!("{} min", self.minutes_until_arrival)
        }
    }
}

/// Result of one transit fetch cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitSnapshot {
    pub m_line: Vec<Prediction>,
    pub bus_29: Vec<Prediction>,
    /// True when the predictions are synthetic because no API key was set
    pub demo_mode: bool,
}

/// Transit fetch errors
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API key rejected (HTTP {0})")]
    Unauthorized(u16),
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<TransitError> for AppError {
    fn from(e: TransitError) -> Self {
        use commute_core::TransitError as Shown;
        match e {
            TransitError::Http(e) => AppError::Network(e.into_network_error()),
            TransitError::Unauthorized(_) => AppError::Transit(Shown::InvalidApiKey),
            TransitError::Status { status, .. } if status >= 500 => {
                AppError::Transit(Shown::ServiceUnavailable)
            }
            TransitError::Status { status, body } => {
                AppError::Transit(Shown::ApiError(format!("HTTP {}: {}", status, body)))
            }
            TransitError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(minutes: u32) -> Prediction {
        Prediction {
            stop_identifier: "17449".to_string(),
            route_label: "M".to_string(),
            minutes_until_arrival: minutes,
            direction: "Embarcadero".to_string(),
        }
    }

    #[test]
    fn test_arrival_label() {
        assert_eq!(prediction(0).arrival_label(), "Arriving");
        assert_eq!(prediction(1).arrival_label(), "1 min");
        assert_eq!(prediction(12).arrival_label(), "12 min");
    }

    #[test]
    fn test_maps_to_app_error() {
        let err: AppError = TransitError::Unauthorized(403).into();
        assert!(matches!(
            err,
            AppError::Transit(commute_core::TransitError::InvalidApiKey)
        ));

        let err: AppError = TransitError::Status {
            status: 503,
            body: String::new(),
        }
        .into();
        assert!(matches!(
            err,
            AppError::Transit(commute_core::TransitError::ServiceUnavailable)
        ));

        let err: AppError = TransitError::Parse("eof".into()).into();
        assert!(matches!(err, AppError::Network(NetworkError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_display() {
        assert!(TransitError::Unauthorized(401).to_string().contains("401"));
        let err = TransitError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(err.to_string().contains("502"));
    }
}
