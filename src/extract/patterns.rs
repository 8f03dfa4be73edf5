//! Shared regex-extraction machinery used by every field extractor
//! (spec §4.3 "Common machinery").
//!
//! Grounded on `services/date_detection.rs`'s `static LazyLock<Vec<(Regex, &str)>>`
//! priority-list pattern.

use regex::Regex;

/// A single candidate pattern for a field, with a capture group index and a
/// priority used both for match ordering and confidence scaling.
///
/// Lower `priority` is tried first and yields higher confidence — priority
/// `1` is the vendor-template's own regex; generic fallbacks use higher
/// numbers.
pub struct Pattern {
    pub regex: Regex,
    pub group: usize,
    pub priority: u32,
}

impl Pattern {
    pub fn new(pattern: &str, group: usize, priority: u32) -> Self {
        Self {
            regex: Regex::new(pattern).expect("field extractor pattern must compile"),
            group,
            priority,
        }
    }
}

/// A matched field value plus the priority of the pattern that produced it.
pub struct Matched {
    pub value: String,
    pub priority: u32,
}

/// Try `patterns` in ascending priority order; return the first capture
/// group whose value is non-empty (spec §4.3).
pub fn extract_with_patterns(text: &str, patterns: &[Pattern]) -> Option<Matched> {
    let mut sorted: Vec<&Pattern> = patterns.iter().collect();
    sorted.sort_by_key(|p| p.priority);

    for pattern in sorted {
        if let Some(caps) = pattern.regex.captures(text) {
            if let Some(m) = caps.get(pattern.group) {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    return Some(Matched {
                        value: value.to_string(),
                        priority: pattern.priority,
                    });
                }
            }
        }
    }
    None
}

/// Confidence for a vendor-template regex match of the given priority `p`
/// (spec §4.3): `max(0.5, 1.0 - 0.1*(p-1))`.
pub fn template_confidence(priority: u32) -> f32 {
    (1.0 - 0.1 * (priority.saturating_sub(1)) as f32).max(0.5)
}

/// Confidence for a generic fallback regex: the template confidence for its
/// priority, scaled by 0.8.
pub fn generic_confidence(priority: u32) -> f32 {
    template_confidence(priority) * 0.8
}

/// Validation rules applied to an extracted value before it is accepted
/// (spec §4.3 `apply_validation`).
#[derive(Default)]
pub struct ValidationRules<'a> {
    pub pattern: Option<&'a Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub exclude_patterns: &'a [Regex],
}

/// Apply `rules` to `value`. All supplied constraints must hold.
pub fn apply_validation(value: &str, rules: &ValidationRules) -> bool {
    if let Some(min) = rules.min_length {
        if value.len() < min {
            return false;
        }
    }
    if let Some(max) = rules.max_length {
        if value.len() > max {
            return false;
        }
    }
    if let Some(pattern) = rules.pattern {
        if !pattern.is_match(value) {
            return false;
        }
    }
    for exclude in rules.exclude_patterns {
        if exclude.is_match(value) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_with_patterns_prefers_lower_priority() {
        let patterns = vec![
            Pattern::new(r"GENERIC-(\d+)", 1, 10),
            Pattern::new(r"TEMPLATE-(\d+)", 1, 1),
        ];
        let text = "GENERIC-999 and TEMPLATE-123";
        let matched = extract_with_patterns(text, &patterns).unwrap();
        assert_eq!(matched.value, "123");
        assert_eq!(matched.priority, 1);
    }

    #[test]
    fn extract_with_patterns_skips_empty_capture() {
        let patterns = vec![Pattern::new(r"PREFIX:(\s*)END", 1, 1)];
        assert!(extract_with_patterns("PREFIX: END", &patterns).is_none());
    }

    #[test]
    fn template_confidence_floor_is_half() {
        assert_eq!(template_confidence(1), 1.0);
        assert!((template_confidence(6) - 0.5).abs() < 1e-6);
        assert_eq!(template_confidence(100), 0.5);
    }

    #[test]
    fn generic_confidence_is_scaled() {
        assert!((generic_confidence(1) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn validation_rules_enforce_length_and_pattern() {
        let pattern = Regex::new(r"^[A-Z0-9_-]+$").unwrap();
        let rules = ValidationRules {
            pattern: Some(&pattern),
            min_length: Some(8),
            max_length: Some(20),
            exclude_patterns: &[],
        };
        assert!(apply_validation("WM-MAN-2024", &rules));
        assert!(!apply_validation("short", &rules));
        assert!(!apply_validation("has a space here", &rules));
    }
}
