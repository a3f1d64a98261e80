mod cli;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commute_core::{
    ApiKeyResolver, Config, EnvSettingsStore, FileSettingsStore, KeyringSettingsStore,
    MemorySettingsStore, SettingsBackend, SettingsProvider, API_KEY_SETTING,
};
use commute_dashboard::render::{render_transit, render_weather};
use commute_dashboard::source::failure_message;
use commute_dashboard::theme::PLAIN;
use commute_dashboard::{
    api_key_status, Dashboard, Flow, LineId, Palette, PanelSource, PanelState, QrOverlay, Theme,
    TransitSource, WeatherSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{Cli, CliCommand, SettingsCommand};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn settings_store(config: &Config) -> Arc<dyn SettingsProvider> {
    match config.settings.backend {
        SettingsBackend::File => Arc::new(FileSettingsStore::new(&config.config_dir)),
        SettingsBackend::Keyring => Arc::new(KeyringSettingsStore::new()),
        SettingsBackend::Env => Arc::new(EnvSettingsStore::new(commute_core::config::ENV_PREFIX)),
        SettingsBackend::Memory => Arc::new(MemorySettingsStore::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    commute_core::init()?;

    let cli = Cli::parse();
    let (config, _) = Config::load_validated()?;
    let settings = settings_store(&config);
    tracing::debug!("Using {} settings store", settings.describe());

    match cli.action() {
        CliCommand::Run => run(config, settings, cli.plain).await,
        CliCommand::Once => once(config, settings, cli.plain).await,
        CliCommand::Settings(command) => manage_settings(&config, settings, command),
        CliCommand::Qr { line } => print_qr(&config, line),
    }
}

fn draw(dashboard: &Dashboard, plain: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if plain {
        write!(stdout, "{}", dashboard.render(Some(PLAIN)))?;
    } else {
        write!(stdout, "{}{}", CLEAR_SCREEN, dashboard.render(None))?;
    }
    stdout.flush()?;
    Ok(())
}

async fn run(config: Config, settings: Arc<dyn SettingsProvider>, plain: bool) -> Result<()> {
    let mut dashboard = Dashboard::new(config, settings)?;
    dashboard.start();
    tracing::info!("Dashboard started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    draw(&dashboard, plain)?;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = dashboard.next_event() => {
                let Some(event) = event else {
                    break;
                };
                if dashboard.needs_redraw(event, plain) {
                    draw(&dashboard, plain)?;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        if dashboard.handle_input(&line) == Flow::Quit {
                            break;
                        }
                        draw(&dashboard, plain)?;
                    }
                    None => stdin_open = false,
                }
            }
        }
    }

    dashboard.shutdown().await;
    tracing::info!("Dashboard stopped");
    Ok(())
}

/// Run one cycle of `source` into a fresh panel state.
async fn load_once<S: PanelSource>(source: &S) -> PanelState<S::Data> {
    let mut state = PanelState::new();
    let cycle = state.begin_cycle();
    match source.load().await {
        Ok(data) => {
            let notice = S::notice(&data);
            state.complete(cycle, data, notice);
        }
        Err(e) => {
            tracing::error!("Failed to fetch {} data: {}", S::KIND, e);
            state.fail(cycle, failure_message::<S>(&e));
        }
    }
    state
}

async fn once(config: Config, settings: Arc<dyn SettingsProvider>, plain: bool) -> Result<()> {
    let api_key = ApiKeyResolver::new(settings.clone(), config.transit.default_api_key.clone());
    let transit = TransitSource::from_config(&config, api_key)?;
    let weather = WeatherSource::from_config(&config)?;

    let (transit_state, weather_state) = tokio::join!(load_once(&transit), load_once(&weather));

    let palette: Palette = if plain {
        PLAIN
    } else {
        Theme::load(settings.as_ref(), config.ui.dark_mode).palette()
    };
    println!(
        "{}",
        render_transit(
            &transit_state,
            &config.transit.m_line,
            &config.transit.bus_29,
            palette
        )
    );
    println!(
        "{}",
        render_weather(&weather_state, &config.weather.location_label, palette)
    );
    Ok(())
}

fn manage_settings(
    config: &Config,
    settings: Arc<dyn SettingsProvider>,
    command: SettingsCommand,
) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let resolver =
                ApiKeyResolver::new(settings.clone(), config.transit.default_api_key.clone());
            println!("Config directory: {}", config.config_dir.display());
            println!("Settings store:   {}", settings.describe());
            println!("{}", api_key_status(&resolver));
            println!(
                "Theme:            {}",
                Theme::load(settings.as_ref(), config.ui.dark_mode).as_str()
            );
        }
        SettingsCommand::SetKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key must not be empty; use `settings clear` to remove it");
            }
            settings
                .set(API_KEY_SETTING, key)
                .context("Failed to save API key")?;
            println!("API key saved to {}", settings.describe());
        }
        SettingsCommand::Clear => {
            settings
                .remove(API_KEY_SETTING)
                .context("Failed to clear API key")?;
            println!("API key cleared; transit will use demo data");
        }
    }
    Ok(())
}

fn print_qr(config: &Config, line: LineId) -> Result<()> {
    let line = match line {
        LineId::MLine => &config.transit.m_line,
        LineId::Bus29 => &config.transit.bus_29,
    };
    let overlay = QrOverlay::for_line(line).context("Failed to render QR code")?;
    println!("{}", overlay.title);
    println!("{}", overlay.code);
    println!("{}", overlay.url);
    println!("{}", commute_dashboard::qr::QR_HINT);
    Ok(())
}
