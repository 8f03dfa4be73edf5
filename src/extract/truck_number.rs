//! Truck-number extraction (spec §4.3 "Truck number"). Optional field;
//! absence is never an error.

use regex::Regex;

use super::patterns::generic_confidence;

const PATTERNS: &[&str] = &[
    r"(?i)Truck\s*#\s*([A-Z0-9-]{1,10})",
    r"(?i)Vehicle\s*#\s*([A-Z0-9-]{1,10})",
    r"(?i)Unit\s*#\s*([A-Z0-9-]{1,10})",
    r"(?i)\bTruck\s+(\d{1,6})\b",
];

pub fn extract_truck_number(text: &str) -> (Option<String>, f32) {
    for pattern in PATTERNS {
        let re = Regex::new(pattern).expect("truck number pattern must compile");
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    return (Some(value.to_string()), generic_confidence(2));
                }
            }
        }
    }
    (None, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_truck_hash() {
        let (value, _) = extract_truck_number("Truck #T-45 loaded at 9am");
        assert_eq!(value.as_deref(), Some("T-45"));
    }

    #[test]
    fn matches_bare_truck_number() {
        let (value, _) = extract_truck_number("Truck 12 arrived on site");
        assert_eq!(value.as_deref(), Some("12"));
    }

    #[test]
    fn absence_is_not_an_error() {
        let (value, confidence) = extract_truck_number("no vehicle information present");
        assert!(value.is_none());
        assert_eq!(confidence, 0.0);
    }
}
