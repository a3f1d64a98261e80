//! Transit arrival predictions for the commute dashboard.
//!
//! Fetches SIRI stop-monitoring data from the 511.org API for two monitored
//! lines, or synthesizes demo arrivals when no API key is configured.

pub mod client;
pub mod demo;
pub mod fetcher;
pub mod predictions;
pub mod siri;
pub mod types;

pub use client::TransitClient;
pub use fetcher::TransitFetcher;
pub use predictions::{extract_predictions, parse_predictions};
pub use types::*;
