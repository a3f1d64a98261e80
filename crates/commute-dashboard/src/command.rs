use std::fmt;
use std::str::FromStr;

/// One of the two monitored lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineId {
    MLine,
    Bus29,
}

impl FromStr for LineId {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" => Ok(LineId::MLine),
            "29" => Ok(LineId::Bus29),
            other => Err(CommandError::UnknownLine(other.to_string())),
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::MLine => write!(f, "m"),
            LineId::Bus29 => write!(f, "29"),
        }
    }
}

/// Interactive command typed on stdin while the dashboard runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    ToggleTheme,
    ShowQr(LineId),
    CloseOverlay,
    SettingsStatus,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type h for help)")]
    Unknown(String),
    #[error("Unknown line '{0}' (use m or 29)")]
    UnknownLine(String),
    #[error("Usage: qr <m|29>")]
    MissingLine,
}

pub const HELP: &str =
    "r refresh | t theme | qr m, qr 29 stop QR | x close | s settings | h help | q quit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Refresh);
        };

        match head.to_lowercase().as_str() {
            "r" | "refresh" => Ok(Command::Refresh),
            "t" | "theme" => Ok(Command::ToggleTheme),
            "qr" => {
                let line = words.next().ok_or(CommandError::MissingLine)?;
                Ok(Command::ShowQr(line.parse()?))
            }
            "x" | "close" => Ok(Command::CloseOverlay),
            "s" | "settings" => Ok(Command::SettingsStatus),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(s.trim().to_string())),
        }
    }
}
