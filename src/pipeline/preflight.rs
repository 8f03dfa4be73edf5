//! Preflight OCRability check (spec §6 configuration surface: `preflight`).
//!
//! Split into an image-only pass, run before OCR is invoked at all, and a
//! post-OCR completeness pass. Both report through the same `LOW_QUALITY_SCAN`
//! reason; which one fired only changes the diagnostic message.

use crate::imaging::PageBitmap;

#[derive(Debug, Clone, Copy)]
pub struct PreflightConfig {
    pub enabled: bool,
    pub dpi_threshold: u32,
    pub min_chars: usize,
    pub blank_std_threshold: f64,
    pub min_resolution: (u32, u32),
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self { enabled: true, dpi_threshold: 150, min_chars: 10, blank_std_threshold: 5.0, min_resolution: (600, 600) }
    }
}

/// Reject a page before spending an OCR call on it: too small to have been
/// scanned at a usable DPI, or so uniform it is almost certainly blank.
pub fn check_image(image: &PageBitmap, config: &PreflightConfig) -> Option<&'static str> {
    if !config.enabled {
        return None;
    }
    let (min_w, min_h) = config.min_resolution;
    if image.width < min_w || image.height < min_h {
        return Some("page resolution below configured minimum");
    }
    let (_, stddev) = image.intensity_stats();
    if stddev < config.blank_std_threshold {
        return Some("page is blank or near-uniform");
    }
    None
}

/// Reject a page after OCR ran but produced too little text to plausibly
/// contain the fields the pipeline needs.
pub fn check_text(text: &str, config: &PreflightConfig) -> Option<&'static str> {
    if !config.enabled {
        return None;
    }
    if text.trim().chars().count() < config.min_chars {
        return Some("too little text recognized");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_never_rejects() {
        let config = PreflightConfig { enabled: false, ..PreflightConfig::default() };
        let blank = PageBitmap::new(4, 4, vec![128u8; 16]);
        assert!(check_image(&blank, &config).is_none());
        assert!(check_text("", &config).is_none());
    }

    #[test]
    fn rejects_below_minimum_resolution() {
        let config = PreflightConfig::default();
        let tiny = PageBitmap::new(10, 10, vec![200u8; 100]);
        assert!(check_image(&tiny, &config).is_some());
    }

    #[test]
    fn rejects_blank_page() {
        let config = PreflightConfig::default();
        let blank = PageBitmap::new(800, 800, vec![255u8; 800 * 800]);
        assert!(check_image(&blank, &config).is_some());
    }

    #[test]
    fn accepts_textured_page_of_sufficient_resolution() {
        let config = PreflightConfig::default();
        let pixels: Vec<u8> = (0..800 * 800).map(|i| ((i * 37) % 256) as u8).collect();
        let textured = PageBitmap::new(800, 800, pixels);
        assert!(check_image(&textured, &config).is_none());
    }

    #[test]
    fn rejects_too_little_text() {
        let config = PreflightConfig::default();
        assert!(check_text("hi", &config).is_some());
        assert!(check_text("a fully legible ticket body", &config).is_none());
    }
}
