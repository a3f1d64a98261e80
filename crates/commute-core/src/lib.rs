pub mod config;
pub mod error;
pub mod settings;

pub use config::{Config, LineConfig, SettingsBackend, TransitConfig, UiConfig, WeatherConfig};
pub use error::{
    AppError, NetworkError, ReqwestErrorExt, SettingsError, TransitError, WeatherError,
};
pub use settings::{
    ApiKeyResolver, EnvSettingsStore, FileSettingsStore, KeySource, KeyringSettingsStore,
    MemorySettingsStore, SettingsProvider, API_KEY_SETTING, THEME_SETTING,
};

use anyhow::Result;

/// Initialize tracing for the application.
///
/// Logs go to stderr so the dashboard can own stdout.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Commute core initialized");
    Ok(())
}
