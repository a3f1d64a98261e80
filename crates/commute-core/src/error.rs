//! Centralized error types for the commute dashboard.
//!
//! Each data source keeps its own detailed error type; the dashboard maps
//! those into [`AppError`] so every panel can show a short, non-technical
//! message via `user_message()` while logs keep the full context.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Transit service error: {0}")]
    Transit(#[from] TransitError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display on a panel.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Settings(e) => e.user_message(),
            AppError::Transit(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Settings store errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read settings: {0}")]
    Read(String),

    #[error("Failed to write settings: {0}")]
    Write(String),

    #[error("Settings store is read-only")]
    ReadOnly,
}

impl SettingsError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SettingsError::Unavailable(_) => "Settings storage is unavailable.",
            SettingsError::Read(_) => "Failed to read settings. Please try again.",
            SettingsError::Write(_) => "Failed to save settings. Please try again.",
            SettingsError::ReadOnly => {
                "Settings come from the environment and cannot be changed here."
            }
        }
    }
}

/// Transit feed errors, as shown to the user.
#[derive(Debug, Error)]
pub enum TransitError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Transit API error: {0}")]
    ApiError(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl TransitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TransitError::InvalidApiKey => "Transit API key was rejected. Check settings.",
            TransitError::ApiError(_) => "Transit service error. Please try again.",
            TransitError::ServiceUnavailable => {
                "Transit service unavailable. Please try again later."
            }
        }
    }
}

/// Weather service errors, as shown to the user.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Forecast location not found. Check settings.",
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::ServiceUnavailable => {
                "Weather service unavailable. Please try again later."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Network(NetworkError::Timeout),
            AppError::Settings(SettingsError::ReadOnly),
            AppError::Transit(TransitError::InvalidApiKey),
            AppError::Weather(WeatherError::ServiceUnavailable),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {:?}", err);
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = TransitError::InvalidApiKey.into();
        assert!(matches!(err, AppError::Transit(TransitError::InvalidApiKey)));
    }

    #[test]
    fn test_user_message_propagation() {
        let err = AppError::Transit(TransitError::InvalidApiKey);
        assert_eq!(
            err.user_message(),
            "Transit API key was rejected. Check settings."
        );
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(upstream.user_message().contains("server"));
        assert_eq!(client.user_message(), "The request failed. Please try again.");
    }
}
