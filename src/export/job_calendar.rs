//! Job-week / job-month labeling (spec §8 P7).
//!
//! Grounded on the original's `utils/date_calculations.py` job-calendar
//! arithmetic, reimplemented against `chrono` rather than ported line for
//! line.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Monday of the ISO week containing `date`.
fn monday_of(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_since_monday as i64)
}

/// 1-indexed week number of `date` relative to `job_start`'s week (P7).
pub fn job_week(date: NaiveDate, job_start: NaiveDate) -> i64 {
    let weeks = (date - monday_of(job_start)).num_days().div_euclid(7);
    weeks + 1
}

/// The Sunday ending `date`'s week, used as the job-week label.
pub fn job_week_label_end(date: NaiveDate) -> NaiveDate {
    monday_of(date) + Duration::days(Weekday::Sun.num_days_from_monday() as i64)
}

/// 1-indexed job-month number relative to `job_start`'s year/month, formatted
/// with three-digit zero padding (P7), e.g. `"001"`.
pub fn job_month(date: NaiveDate, job_start: NaiveDate) -> String {
    let months = 12 * (date.year() - job_start.year()) + (date.month() as i32 - job_start.month() as i32) + 1;
    format!("{months:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn job_week_one_covers_the_start_date_itself() {
        let start = d(2025, 10, 1); // Wednesday
        assert_eq!(job_week(start, start), 1);
    }

    #[test]
    fn job_week_advances_every_seven_days() {
        let start = d(2025, 10, 1); // Wednesday; job-start week runs Sep 29 - Oct 5
        assert_eq!(job_week(d(2025, 10, 5), start), 1); // Sunday closing the start week
        assert_eq!(job_week(d(2025, 10, 6), start), 2); // Monday of the next week
        assert_eq!(job_week(d(2025, 10, 12), start), 2);
        assert_eq!(job_week(d(2025, 10, 13), start), 3);
    }

    #[test]
    fn job_week_label_end_is_the_sunday_of_that_week() {
        assert_eq!(job_week_label_end(d(2025, 10, 1)).weekday(), Weekday::Sun);
        assert_eq!(job_week_label_end(d(2025, 10, 1)), d(2025, 10, 5));
    }

    #[test]
    fn job_month_one_covers_the_start_month() {
        let start = d(2025, 10, 1);
        assert_eq!(job_month(d(2025, 10, 17), start), "001");
    }

    #[test]
    fn job_month_advances_across_year_boundary() {
        let start = d(2025, 10, 1);
        assert_eq!(job_month(d(2025, 11, 1), start), "002");
        assert_eq!(job_month(d(2026, 1, 1), start), "004");
        assert_eq!(job_month(d(2026, 10, 1), start), "013");
    }
}
