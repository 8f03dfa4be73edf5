//! Manifest-number extraction (spec §4.3 "Manifest number").
//!
//! Well-formedness here is purely a shape check; whether a manifest is
//! *required* at all is decided later by [`crate::validate`].

use regex::Regex;

use super::patterns::{apply_validation, generic_confidence, template_confidence, ValidationRules};

struct ManifestPattern {
    regex: &'static str,
    priority: u32,
}

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern { regex: r"\b(WM-MAN-\d{4}-\d{6})\b", priority: 1 },
    ManifestPattern { regex: r"(?i)MAN\s*#\s*([A-Z0-9_-]{4,20})", priority: 2 },
    ManifestPattern { regex: r"(?i)MANIFEST:\s*([A-Z0-9_-]{4,20})", priority: 3 },
    ManifestPattern { regex: r"(?i)MFST:\s*([A-Z0-9_-]{4,20})", priority: 4 },
];

fn is_well_formed(value: &str) -> bool {
    let upper = value.trim().to_ascii_uppercase();
    let pattern = Regex::new(r"^[A-Z0-9_-]+$").expect("manifest format pattern must compile");
    let rules = ValidationRules {
        pattern: Some(&pattern),
        min_length: Some(8),
        max_length: Some(20),
        exclude_patterns: &[],
    };
    apply_validation(&upper, &rules)
}

/// Extract a candidate manifest number.
///
/// Returns `(value, confidence, well_formed)`. The raw value is always
/// returned even when malformed — per spec §4.3 a mismatch is passed
/// through to trigger downstream review rather than discarded.
pub fn extract_manifest_number(text: &str) -> (Option<String>, f32, bool) {
    let mut sorted: Vec<&ManifestPattern> = PATTERNS.iter().collect();
    sorted.sort_by_key(|p| p.priority);

    for pattern in sorted {
        let re = Regex::new(pattern.regex).expect("manifest pattern must compile");
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                let value = m.as_str().trim();
                if value.is_empty() {
                    continue;
                }
                let confidence = if pattern.priority == 1 {
                    template_confidence(1)
                } else {
                    generic_confidence(pattern.priority)
                };
                let well_formed = is_well_formed(value);
                return (Some(value.to_string()), confidence, well_formed);
            }
        }
    }
    (None, 0.0, false)
}
