use std::time::Duration;

use crate::compress::{normalize_quality, DEFAULT_QUALITY};
use crate::pdf::{PageLayout, PDF_FILE_NAME};

/// Delay between a finished compression and the reveal of its preview.
pub const REVEAL_DELAY: Duration = Duration::from_secs(2);

/// Session tunables shared by both screens.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Quality the compressor starts at and returns to on reset.
    pub default_quality: f32,
    pub reveal_delay: Duration,
    pub pdf_layout: PageLayout,
    pub pdf_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_quality: DEFAULT_QUALITY,
            reveal_delay: REVEAL_DELAY,
            pdf_layout: PageLayout::default(),
            pdf_file_name: PDF_FILE_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Overrides the starting quality; out-of-range values are clamped.
    pub fn with_default_quality(mut self, quality: f32) -> Self {
        if let Some(q) = normalize_quality(quality) {
            self.default_quality = q;
        }
        self
    }

    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_compressor_ui() {
        let settings = Settings::default();
        assert_eq!(settings.default_quality, 0.8);
        assert_eq!(settings.reveal_delay, Duration::from_secs(2));
        assert_eq!(settings.pdf_file_name, "converted_image.pdf");
    }

    #[test]
    fn default_quality_override_is_clamped() {
        let settings = Settings::default().with_default_quality(3.0);
        assert!((settings.default_quality - 1.0).abs() < 1e-6);
        let settings = Settings::default().with_default_quality(f32::NAN);
        assert_eq!(settings.default_quality, 0.8);
    }
}
