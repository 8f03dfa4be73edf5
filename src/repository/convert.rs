//! Row <-> domain-model conversions shared by the entity repositories.
//!
//! The schema stores dates and timestamps as ISO-8601 `Text` (see
//! `schema.rs`); these helpers centralize the parsing so each repository
//! only deals in `chrono` types.

use chrono::{DateTime, NaiveDate, Utc};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|_| {
        tracing::warn!(raw, "unparseable stored date, defaulting to epoch");
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid constant date")
    })
}

pub fn format_datetime(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn parse_datetime(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            tracing::warn!(raw, "unparseable stored timestamp, defaulting to epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

pub fn parse_datetime_opt(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.map(|s| parse_datetime(&s))
}

pub fn bool_to_int(value: bool) -> i32 {
    if value {
        1
    } else {
        0
    }
}

pub fn int_to_bool(value: i32) -> bool {
    value != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trips() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert_eq!(parse_date(&format_date(date)), date);
    }

    #[test]
    fn bool_round_trips() {
        assert!(int_to_bool(bool_to_int(true)));
        assert!(!int_to_bool(bool_to_int(false)));
    }
}
