//! Ticket-number extraction (spec §4.3 "Ticket number").

use super::patterns::{generic_confidence, template_confidence, Pattern};

/// Reject 8-digit values that look like a `YYYYMMDD` date rather than a
/// ticket number: begins with `20` and the trailing four digits form a
/// plausible month/day.
fn is_date_like(value: &str) -> bool {
    if value.len() != 8 || !value.starts_with("20") {
        return false;
    }
    let month: u32 = match value[4..6].parse() {
        Ok(m) => m,
        Err(_) => return false,
    };
    let day: u32 = match value[6..8].parse() {
        Ok(d) => d,
        Err(_) => return false,
    };
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

/// Extract a ticket number from OCR `text`.
///
/// Precedence: `vendor_pattern` (if the detected vendor's template supplies
/// one) → `WM-NNNNNNNN` → bare 10-digit → bare 7-9 digit. Values that look
/// like an 8-digit calendar date are skipped in favor of the next pattern.
pub fn extract_ticket_number(text: &str, vendor_pattern: Option<&str>) -> (Option<String>, f32) {
    let mut patterns = Vec::new();
    if let Some(raw) = vendor_pattern {
        patterns.push(Pattern::new(raw, 1, 1));
    }
    patterns.push(Pattern::new(r"\b(WM-\d{8})\b", 1, 2));
    patterns.push(Pattern::new(r"\b(\d{10})\b", 1, 3));
    patterns.push(Pattern::new(r"\b(\d{7,9})\b", 1, 4));

    let mut sorted: Vec<&Pattern> = patterns.iter().collect();
    sorted.sort_by_key(|p| p.priority);

    for pattern in sorted {
        let Some(caps) = pattern.regex.captures(text) else {
            continue;
        };
        let Some(m) = caps.get(pattern.group) else {
            continue;
        };
        let value = m.as_str().trim();
        if value.is_empty() || is_date_like(value) {
            continue;
        }
        let confidence = if pattern.priority == 1 {
            template_confidence(1)
        } else {
            generic_confidence(pattern.priority)
        };
        return (Some(value.to_string()), confidence);
    }
    (None, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_vendor_template_over_generic() {
        let (value, confidence) =
            extract_ticket_number("Ticket: T-55512 filed under WM-12345678", Some(r"Ticket:\s*(T-\d+)"));
        assert_eq!(value.as_deref(), Some("T-55512"));
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn matches_wm_prefixed_generic_pattern() {
        let (value, confidence) = extract_ticket_number("ref WM-87654321 below", None);
        assert_eq!(value.as_deref(), Some("WM-87654321"));
        assert!((confidence - generic_confidence(2)).abs() < 1e-6);
    }

    #[test]
    fn skips_date_like_eight_digit_value() {
        let (value, _) = extract_ticket_number("Printed 20240315 ticket 4815162", None);
        assert_eq!(value.as_deref(), Some("4815162"));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let (value, confidence) = extract_ticket_number("no numbers here", None);
        assert!(value.is_none());
        assert_eq!(confidence, 0.0);
    }
}
