//! Plain-text rendering of panel state.

use std::fmt::Write;

use commute_core::LineConfig;
use commute_transit::{Prediction, TransitSnapshot};
use commute_weather::ForecastDay;

use crate::state::{MessageKind, PanelMessage, PanelState};
use crate::theme::Palette;

pub const NO_PREDICTIONS: &str = "No predictions available";
pub const NO_FORECAST: &str = "No forecast data available";

fn message_line(out: &mut String, message: Option<&PanelMessage>, p: Palette) {
    if let Some(message) = message {
        let color = match message.kind {
            MessageKind::Notice => p.notice,
            MessageKind::Error => p.error,
        };
        let _ = writeln!(out, "  {}{}{}", color, message.text, p.reset);
    }
}

fn last_updated_line<T>(out: &mut String, state: &PanelState<T>, p: Palette) {
    if let Some(at) = state.last_updated() {
        let _ = writeln!(
            out,
            "  {}Last updated: {}{}",
            p.muted,
            at.format("%H:%M:%S"),
            p.reset
        );
    }
}

/// Arrival labels joined on one line, e.g. "Arriving | 8 min | 15 min"
pub fn arrivals(predictions: &[Prediction]) -> String {
    if predictions.is_empty() {
        return NO_PREDICTIONS.to_string();
    }
    predictions
        .iter()
        .map(Prediction::arrival_label)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn line_block(out: &mut String, line: &LineConfig, predictions: &[Prediction], p: Palette) {
    let _ = writeln!(
        out,
        "  {}[{}]{} {}{}{}  {}(qr {}){}",
        p.accent,
        line.route_token,
        p.reset,
        p.text,
        line.direction,
        p.reset,
        p.muted,
        line.route_token.to_lowercase(),
        p.reset
    );
    let _ = writeln!(out, "      {}", arrivals(predictions));
}

pub fn render_transit(
    state: &PanelState<TransitSnapshot>,
    m_line: &LineConfig,
    bus_29: &LineConfig,
    p: Palette,
) -> String {
    let mut out = String::new();
    let refreshing = if state.is_loading() { " (refreshing)" } else { "" };
    let _ = writeln!(out, "{}SF Muni{}{}", p.heading, refreshing, p.reset);

    message_line(&mut out, state.message(), p);

    match state.data() {
        Some(snapshot) => {
            line_block(&mut out, m_line, &snapshot.m_line, p);
            line_block(&mut out, bus_29, &snapshot.bus_29, p);
        }
        None if state.is_loading() => {
            let _ = writeln!(out, "  Loading transit data...");
        }
        None => {}
    }

    last_updated_line(&mut out, state, p);
    out
}

fn day_line(out: &mut String, day: &ForecastDay, p: Palette) {
    let _ = writeln!(
        out,
        "  {}{:<3} {:<6}{} {}  {:<22} {}{:>3}°{} / {:>3}°",
        p.text,
        day.weekday_label,
        day.date,
        p.reset,
        day.icon_glyph,
        day.condition_text,
        p.heading,
        day.high_temp,
        p.reset,
        day.low_temp
    );
}

pub fn render_weather(state: &PanelState<Vec<ForecastDay>>, location: &str, p: Palette) -> String {
    let mut out = String::new();
    let refreshing = if state.is_loading() { " (refreshing)" } else { "" };
    let _ = writeln!(
        out,
        "{}5-Day Forecast{}{}  {}{}{}",
        p.heading, refreshing, p.reset, p.muted, location, p.reset
    );

    message_line(&mut out, state.message(), p);

    match state.data() {
        Some(days) if days.is_empty() => {
            let _ = writeln!(out, "  {}", NO_FORECAST);
        }
        Some(days) => days.iter().for_each(|day| day_line(&mut out, day, p)),
        None if state.is_loading() => {
            let _ = writeln!(out, "  Loading weather data...");
        }
        None => {}
    }

    last_updated_line(&mut out, state, p);
    out
}
