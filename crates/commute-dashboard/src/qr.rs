//! Stop QR codes rendered as terminal text.

use commute_core::LineConfig;
use qrcode::render::unicode;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

pub const QR_HINT: &str = "Scan to view stop details and schedules";

/// An open QR overlay for one monitored line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOverlay {
    pub title: String,
    pub url: String,
    pub code: String,
}

impl QrOverlay {
    pub fn for_line(line: &LineConfig) -> Result<Self, QrError> {
        Ok(Self {
            title: format!("{} Stop", line.label),
            url: line.stop_url.clone(),
            code: render_qr(&line.stop_url)?,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n{}\n{}\n\n[x] close",
            self.title, self.code, self.url, QR_HINT
        )
    }
}

/// Encode `data` at error-correction level H, two modules per character
/// row, dark modules drawn light so the code reads on dark terminals.
pub fn render_qr(data: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_core::TransitConfig;

    #[test]
    fn test_overlay_for_m_line() {
        let line = TransitConfig::default_m_line();
        let overlay = QrOverlay::for_line(&line).unwrap();

        assert_eq!(overlay.title, "M Line Stop");
        assert_eq!(overlay.url, line.stop_url);
        assert!(!overlay.code.is_empty());

        let text = overlay.render();
        assert!(text.contains(QR_HINT));
        assert!(text.contains("sfmta.com/stops"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render_qr("https://www.sfmta.com/stops/winston-dr-20th-ave-16951").unwrap();
        let b = render_qr("https://www.sfmta.com/stops/winston-dr-20th-ave-16951").unwrap();
        assert_eq!(a, b);
        assert!(a.lines().count() > 10);
    }

    #[test]
    fn test_oversized_payload_fails() {
        let data = "x".repeat(4000);
        assert!(render_qr(&data).is_err());
    }
}
