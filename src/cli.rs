use clap::{Parser, Subcommand};
use commute_dashboard::LineId;

/// Transit arrivals and the weather forecast in your terminal
#[derive(Debug, Parser)]
#[command(name = "commute", version, about)]
pub struct Cli {
    /// Disable colors and screen clearing
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Live dashboard, refreshed on a timer (default)
    Run,
    /// Fetch transit and weather once, print them and exit
    Once,
    /// Inspect or change the stored API key
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Print the QR code of a stop page
    Qr {
        /// Line whose stop to show: m or 29
        line: LineId,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum SettingsCommand {
    /// Show where settings are stored and whether a key is set
    Show,
    /// Save a 511.org API key
    SetKey { key: String },
    /// Remove the stored API key (transit falls back to demo mode)
    Clear,
}

impl Cli {
    pub fn action(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Run)
    }
}
