use commute_core::{SettingsError, SettingsProvider, THEME_SETTING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// ANSI escape sequences used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub heading: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub notice: &'static str,
    pub error: &'static str,
    pub reset: &'static str,
}

const LIGHT: Palette = Palette {
    heading: "\x1b[1;30m",
    text: "\x1b[30m",
    muted: "\x1b[90m",
    accent: "\x1b[34m",
    notice: "\x1b[33m",
    error: "\x1b[31m",
    reset: "\x1b[0m",
};

const DARK: Palette = Palette {
    heading: "\x1b[1;97m",
    text: "\x1b[37m",
    muted: "\x1b[90m",
    accent: "\x1b[96m",
    notice: "\x1b[93m",
    error: "\x1b[91m",
    reset: "\x1b[0m",
};

/// No escapes at all, for piped output and tests
pub const PLAIN: Palette = Palette {
    heading: "",
    text: "",
    muted: "",
    accent: "",
    notice: "",
    error: "",
    reset: "",
};

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Glyph of the toggle: the theme you would switch to
    pub fn toggle_glyph(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => LIGHT,
            Theme::Dark => DARK,
        }
    }

    /// Stored preference, falling back to the configured default.
    pub fn load(store: &dyn SettingsProvider, default_dark: bool) -> Self {
        let fallback = if default_dark { Theme::Dark } else { Theme::Light };
        match store.get(THEME_SETTING) {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Ignoring unknown theme '{}'", value);
                fallback
            }),
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!("Could not read theme preference: {}", e);
                fallback
            }
        }
    }

    pub fn save(self, store: &dyn SettingsProvider) -> Result<(), SettingsError> {
        store.set(THEME_SETTING, self.as_str())
    }
}
