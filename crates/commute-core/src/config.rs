use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable prefix for configuration overrides,
/// e.g. `COMMUTE_TRANSIT__AGENCY=SF`.
pub const ENV_PREFIX: &str = "COMMUTE";

const CONFIG_FILE: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application configuration directory (not persisted)
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Transit feed settings
    pub transit: TransitConfig,

    /// Weather settings
    pub weather: WeatherConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// Where the API key and theme are persisted
    pub settings: SettingsConfig,
}

/// One monitored route at one stop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineConfig {
    /// Substring matched against the feed's `LineRef`
    pub route_token: String,
    pub stop_code: String,
    /// Label used for demo data and headings
    pub label: String,
    pub direction: String,
    /// Additive offsets for the second and third demo arrivals
    pub demo_offsets: [u32; 2],
    /// External stop page shown as a QR code
    pub stop_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub api_base_url: String,
    pub agency: String,
    /// Fallback API key when the settings store has none
    pub default_api_key: Option<String>,
    pub refresh_seconds: u64,
    /// Artificial delay before demo data appears
    pub demo_delay_ms: u64,
    pub request_timeout_seconds: u64,
    pub m_line: LineConfig,
    pub bus_29: LineConfig,
}

impl TransitConfig {
    pub fn default_m_line() -> LineConfig {
        LineConfig {
            route_token: "M".to_string(),
            stop_code: "17449".to_string(),
            label: "M Line".to_string(),
            direction: "Inbound to Embarcadero".to_string(),
            demo_offsets: [8, 15],
            stop_url: "https://www.sfmta.com/stops/19th-ave-winston-dr-stonestown-17449"
                .to_string(),
        }
    }

    pub fn default_bus_29() -> LineConfig {
        LineConfig {
            route_token: "29".to_string(),
            stop_code: "16950".to_string(),
            label: "29 Bus".to_string(),
            direction: "To Presidio".to_string(),
            demo_offsets: [12, 20],
            stop_url: "https://www.sfmta.com/stops/winston-dr-20th-ave-16951".to_string(),
        }
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.511.org/transit".to_string(),
            agency: "SF".to_string(),
            default_api_key: None,
            refresh_seconds: 30,
            demo_delay_ms: 500,
            request_timeout_seconds: 10,
            m_line: Self::default_m_line(),
            bus_29: Self::default_bus_29(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Heading shown next to the forecast
    pub location_label: String,
    pub refresh_seconds: u64,
    pub request_timeout_seconds: u64,
    /// api.weather.gov rejects requests without one
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.weather.gov".to_string(),
            latitude: 37.7272,
            longitude: -122.4656,
            location_label: "San Francisco (94132)".to_string(),
            refresh_seconds: 600,
            request_timeout_seconds: 10,
            user_agent: format!("commute/{} (personal dashboard)", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Start in dark mode unless a theme was saved in settings
    pub dark_mode: bool,
}

/// Backend used for the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettingsBackend {
    #[default]
    File,
    Keyring,
    Env,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub backend: SettingsBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            transit: TransitConfig::default(),
            weather: WeatherConfig::default(),
            ui: UiConfig::default(),
            settings: SettingsConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commute")
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if none exists. `COMMUTE_*` environment variables override it.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("commute");
        Self::load_from(&config_dir)
    }

    /// Load configuration from `config_dir/config.toml` plus environment overrides.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            let config = Self {
                config_dir: config_dir.to_path_buf(),
                ..Self::default()
            };
            if let Err(e) = config.save() {
                tracing::warn!("Could not write default config: {:#}", e);
            }
        }

        let mut config: Config = config::Config::builder()
            .add_source(config::File::from(config_path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?
            .try_deserialize()
            .context("Failed to parse config file")?;

        config.config_dir = config_dir.to_path_buf();
        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration and validate it, logging any warnings.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.transit.api_base_url, "transit.api_base_url", &mut result);
        validate_url(&self.weather.api_base_url, "weather.api_base_url", &mut result);

        if self.transit.agency.trim().is_empty() {
            result.add_error("transit.agency", "Agency code must not be empty");
        }

        for (field, line) in [
            ("transit.m_line", &self.transit.m_line),
            ("transit.bus_29", &self.transit.bus_29),
        ] {
            if line.route_token.trim().is_empty() {
                result.add_error(format!("{}.route_token", field), "Route token must not be empty");
            }
            if line.stop_code.trim().is_empty() {
                result.add_error(format!("{}.stop_code", field), "Stop code must not be empty");
            }
            if Url::parse(&line.stop_url).is_err() {
                result.add_warning(
                    format!("{}.stop_url", field),
                    "Stop URL is not a valid URL; the QR code may not scan",
                );
            }
        }

        if self.transit.refresh_seconds == 0 {
            result.add_error("transit.refresh_seconds", "Refresh interval must be greater than 0");
        } else if self.transit.refresh_seconds < 15 {
            result.add_warning(
                "transit.refresh_seconds",
                "Refreshing more often than every 15 seconds may exhaust the 511.org rate limit",
            );
        }

        if self.weather.refresh_seconds == 0 {
            result.add_error("weather.refresh_seconds", "Refresh interval must be greater than 0");
        } else if self.weather.refresh_seconds > 86_400 {
            result.add_warning(
                "weather.refresh_seconds",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if !(-90.0..=90.0).contains(&self.weather.latitude) {
            result.add_error("weather.latitude", "Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.weather.longitude) {
            result.add_error("weather.longitude", "Longitude must be between -180 and 180");
        }

        if self.weather.user_agent.trim().is_empty() {
            result.add_error("weather.user_agent", "api.weather.gov requires a User-Agent");
        }

        result
    }

    /// Save configuration to `config_dir/config.toml`
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(self.config_dir.join(CONFIG_FILE), contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }
            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
