//! Ticket-date extraction (spec §4.3 "Date").

use chrono::{Duration, NaiveDate};
use regex::Regex;

use super::patterns::{generic_confidence, template_confidence};

/// `(capture regex, chrono format)` pairs tried in precedence order for the
/// generic (non-template) pass.
const GENERIC_FORMATS: &[(&str, &str)] = &[
    (r"\b(\d{1,2}/\d{1,2}/\d{4})\b", "%m/%d/%Y"),
    (r"\b(\d{1,2}-\d{1,2}-\d{4})\b", "%m-%d-%Y"),
    (r"\b(\d{4}-\d{1,2}-\d{1,2})\b", "%Y-%m-%d"),
    (r"\b(\d{1,2}/\d{1,2}/\d{2})\b", "%m/%d/%y"),
    (r"\b(\d{1,2}-[A-Za-z]{3}-\d{4})\b", "%d-%b-%Y"),
    (r"\b(\d{1,2}-[A-Za-z]+-\d{4})\b", "%d-%B-%Y"),
];

/// Try every known format against a single already-isolated date string
/// (used for the filename-hint path, which has no surrounding text to
/// capture from).
fn parse_any_format(candidate: &str) -> Option<NaiveDate> {
    GENERIC_FORMATS
        .iter()
        .find_map(|(_, fmt)| NaiveDate::parse_from_str(candidate, fmt).ok())
}

fn in_acceptable_range(date: NaiveDate, today: NaiveDate) -> bool {
    let floor = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid constant date");
    let recency_floor = today - Duration::days(180);
    let ceiling = today + Duration::days(7);
    date >= floor && date >= recency_floor && date <= ceiling
}

/// Extract the ticket date.
///
/// Precedence: `filename_hint` (already-isolated date string from the
/// filename convention) → `vendor_pattern` (template regex) → generic
/// format list. A candidate that parses but falls outside
/// `[max(2020-01-01, today-180d), today+7d]` is discarded in favor of the
/// next-lower-precedence source.
pub fn extract_date(
    text: &str,
    filename_hint: Option<&str>,
    vendor_pattern: Option<&str>,
    today: NaiveDate,
) -> (Option<NaiveDate>, f32) {
    if let Some(hint) = filename_hint {
        if let Some(date) = parse_any_format(hint) {
            if in_acceptable_range(date, today) {
                return (Some(date), 1.0);
            }
        }
    }

    if let Some(raw) = vendor_pattern {
        if let Ok(re) = Regex::new(raw) {
            if let Some(caps) = re.captures(text) {
                if let Some(m) = caps.get(1) {
                    if let Some(date) = parse_any_format(m.as_str().trim()) {
                        if in_acceptable_range(date, today) {
                            return (Some(date), template_confidence(1));
                        }
                    }
                }
            }
        }
    }

    for (pattern, fmt) in GENERIC_FORMATS {
        let re = Regex::new(pattern).expect("generic date pattern must compile");
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                if let Ok(date) = NaiveDate::parse_from_str(m.as_str().trim(), fmt) {
                    if in_acceptable_range(date, today) {
                        return (Some(date), generic_confidence(2));
                    }
                }
            }
        }
    }

    (None, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    #[test]
    fn filename_hint_wins_and_is_full_confidence() {
        let (date, confidence) = extract_date("unrelated text", Some("2026-07-20"), None, today());
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 7, 20));
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn falls_back_to_generic_pattern() {
        let (date, confidence) = extract_date("Ticket dated 07/15/2026 for pickup", None, None, today());
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 7, 15));
        assert!(confidence > 0.0);
    }

    #[test]
    fn rejects_date_before_2020() {
        let (date, _) = extract_date("Dated 01/01/2019", None, None, today());
        assert!(date.is_none());
    }

    #[test]
    fn rejects_date_too_far_in_future() {
        let (date, _) = extract_date("Dated 12/01/2026", None, None, today());
        assert!(date.is_none());
    }

    #[test]
    fn rejects_date_older_than_180_days() {
        let (date, _) = extract_date("Dated 01/01/2026", None, None, today());
        assert!(date.is_none());
    }

    #[test]
    fn parses_day_month_name_form() {
        let (date, _) = extract_date("Issued 15-Jul-2026 at site", None, None, today());
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 7, 15));
    }
}
