//! Quantity + unit extraction (spec §4.3 "Quantity").

use bigdecimal::BigDecimal;
use regex::Regex;
use std::str::FromStr;

use super::patterns::{generic_confidence, template_confidence};
use crate::models::QuantityUnit;

/// Default last-resort value when no quantity can be extracted at all
/// (spec §4.3): one load, confidence 0.5.
fn fallback() -> (BigDecimal, QuantityUnit, f32) {
    (BigDecimal::from_str("1.0").expect("literal parses"), QuantityUnit::Loads, 0.5)
}

fn in_range(value: &BigDecimal) -> bool {
    *value > BigDecimal::from(0) && *value <= BigDecimal::from(50)
}

/// Extract `(quantity, unit, confidence)`.
///
/// Precedence: `vendor_pattern` (template regex capturing `value` and
/// `unit` groups) → a generic `<number> <unit-word>` pattern → the
/// `(1.0, LOADS, 0.5)` fallback when nothing parses or the parsed value
/// falls outside `(0, 50]`.
pub fn extract_quantity(text: &str, vendor_pattern: Option<&str>) -> (BigDecimal, QuantityUnit, f32) {
    if let Some(raw) = vendor_pattern {
        if let Ok(re) = Regex::new(raw) {
            if let Some(caps) = re.captures(text) {
                if let (Some(value_m), Some(unit_m)) = (caps.name("value"), caps.name("unit")) {
                    if let Some(result) = try_value(value_m.as_str(), unit_m.as_str(), template_confidence(1)) {
                        return result;
                    }
                }
            }
        }
    }

    let generic = Regex::new(
        r"(?i)\b(\d{1,3}(?:\.\d{1,2})?)\s*(TONS?|CY|CUBIC\s+YARDS?|LOADS?|LBS?|POUNDS?)\b",
    )
    .expect("generic quantity pattern must compile");
    if let Some(caps) = generic.captures(text) {
        if let (Some(value_m), Some(unit_m)) = (caps.get(1), caps.get(2)) {
            if let Some(result) = try_value(value_m.as_str(), unit_m.as_str(), generic_confidence(2)) {
                return result;
            }
        }
    }

    fallback()
}

fn try_value(raw_value: &str, raw_unit: &str, confidence: f32) -> Option<(BigDecimal, QuantityUnit, f32)> {
    let value = BigDecimal::from_str(raw_value).ok()?;
    if !in_range(&value) {
        return None;
    }
    let unit = QuantityUnit::parse(raw_unit)?;
    Some((value, unit, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_generic_tons() {
        let (value, unit, confidence) = extract_quantity("Net weight 22.5 TONS delivered", None);
        assert_eq!(value, BigDecimal::from_str("22.5").unwrap());
        assert_eq!(unit, QuantityUnit::Tons);
        assert!(confidence > 0.0);
    }

    #[test]
    fn extracts_cubic_yards_alias() {
        let (_, unit, _) = extract_quantity("14 CUBIC YARDS hauled", None);
        assert_eq!(unit, QuantityUnit::CubicYards);
    }

    #[test]
    fn rejects_out_of_range_value_and_falls_back() {
        let (value, unit, confidence) = extract_quantity("99999 TONS bogus reading", None);
        assert_eq!(value, BigDecimal::from_str("1.0").unwrap());
        assert_eq!(unit, QuantityUnit::Loads);
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn falls_back_when_nothing_matches() {
        let (value, unit, confidence) = extract_quantity("no quantity mentioned anywhere", None);
        assert_eq!(value, BigDecimal::from_str("1.0").unwrap());
        assert_eq!(unit, QuantityUnit::Loads);
        assert_eq!(confidence, 0.5);
    }
}
