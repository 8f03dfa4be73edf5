//! OCR engine seam (spec §6 "OCR engine contract", §9 "Dynamic dispatch by
//! engine name" and "Process-wide caches").
//!
//! Grounded on `ocr/extractor.rs`'s `ExtractionError`/`ExtractionResult`
//! shape: the engine is external, but the crate needs a stable adapter
//! trait plus a tagged selector so the page pipeline doesn't depend on any
//! engine-specific return type beyond `text` and an optional confidence.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::imaging::PageBitmap;

/// Errors raised by an OCR adapter.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("OCR call failed: {0}")]
    Failed(String),
}

/// Which OCR backend produced a result. The original selects these by
/// string name; here they are a closed tagged enum (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrEngine {
    Tesseract,
    EasyOcr,
    Doctr,
    /// No real engine configured; used in tests and for pages with no
    /// image available. Always returns empty text at zero confidence.
    Fallback,
}

impl OcrEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrEngine::Tesseract => "tesseract",
            OcrEngine::EasyOcr => "easyocr",
            OcrEngine::Doctr => "doctr",
            OcrEngine::Fallback => "fallback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tesseract" => Some(OcrEngine::Tesseract),
            "easyocr" => Some(OcrEngine::EasyOcr),
            "doctr" => Some(OcrEngine::Doctr),
            "fallback" => Some(OcrEngine::Fallback),
            _ => None,
        }
    }
}

/// How a page's orientation was determined. Returned explicitly by the
/// orientation step rather than cached in a hidden global (spec §9
/// "Process-wide caches" — "Replace with ... an explicit `OrientationHint`
/// returned from the orientation step").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationHint {
    /// Clockwise rotation applied before OCR, in degrees (0, 90, 180, 270).
    pub rotation_degrees: u16,
    /// Whether the rotation came from the engine's own detector vs. a
    /// carried-over value from a prior page of the same file.
    pub detected: bool,
}

impl OrientationHint {
    pub fn upright() -> Self {
        Self { rotation_degrees: 0, detected: false }
    }
}

/// The `(text, confidence, page_hash, orientation)` tuple an OCR call
/// yields per page (spec §4.9 step 2).
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
    pub orientation: OrientationHint,
}

/// A single adapter interface every engine implements: image in, text out.
/// Keeps the page pipeline from depending on any engine-specific type.
pub trait OcrAdapter: Send + Sync {
    fn engine(&self) -> OcrEngine;
    fn recognize(&self, image: &PageBitmap) -> Result<OcrResult, OcrError>;
}

/// Always returns empty text at zero confidence. Used where no real OCR
/// engine is configured (tests, or a deployment with rendering disabled).
pub struct FallbackAdapter;

impl OcrAdapter for FallbackAdapter {
    fn engine(&self) -> OcrEngine {
        OcrEngine::Fallback
    }

    fn recognize(&self, _image: &PageBitmap) -> Result<OcrResult, OcrError> {
        Ok(OcrResult { text: String::new(), confidence: 0.0, orientation: OrientationHint::upright() })
    }
}

/// Explicit, caller-owned memoization of OCR results keyed by file path and
/// page number. Replaces the module-level dictionaries the original keeps
/// (spec §9): no hidden globals, the caller decides the cache's lifetime.
#[derive(Default)]
pub struct OcrCache {
    entries: HashMap<(String, u32), OcrResult>,
}

impl OcrCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path, page: u32) -> Option<&OcrResult> {
        self.entries.get(&(path.display().to_string(), page))
    }

    pub fn insert(&mut self, path: &Path, page: u32, result: OcrResult) {
        self.entries.insert((path.display().to_string(), page), result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_name_round_trips() {
        for engine in [OcrEngine::Tesseract, OcrEngine::EasyOcr, OcrEngine::Doctr, OcrEngine::Fallback] {
            assert_eq!(OcrEngine::parse(engine.as_str()), Some(engine));
        }
    }

    #[test]
    fn unknown_engine_name_is_none() {
        assert_eq!(OcrEngine::parse("magic"), None);
    }

    #[test]
    fn fallback_adapter_returns_empty_zero_confidence() {
        let adapter = FallbackAdapter;
        let bitmap = PageBitmap::new(1, 1, vec![0]);
        let result = adapter.recognize(&bitmap).unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn cache_round_trips_by_path_and_page() {
        let mut cache = OcrCache::new();
        let path = Path::new("ticket.pdf");
        assert!(cache.get(path, 1).is_none());
        cache.insert(path, 1, OcrResult { text: "hi".into(), confidence: 0.9, orientation: OrientationHint::upright() });
        assert_eq!(cache.get(path, 1).unwrap().text, "hi");
        assert!(cache.get(path, 2).is_none());
        cache.clear();
        assert!(cache.get(path, 1).is_none());
    }
}
