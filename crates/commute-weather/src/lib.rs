//! Weather forecast for the commute dashboard.
//!
//! Provides a 5-day forecast from the National Weather Service API
//! (api.weather.gov, no API key required) for a fixed coordinate.

pub mod provider;
pub mod reduce;
pub mod types;

pub use provider::WeatherProvider;
pub use reduce::{reduce_periods, FORECAST_DAYS};
pub use types::*;
