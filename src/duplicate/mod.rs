//! Duplicate Detector (C6) — `(ticket_number, vendor, date±120d)` window
//! matching (spec §4.6). Window selection and tie-breaking are pure
//! functions here; the repository layer supplies the candidate rows
//! already filtered by ticket number, vendor, and `duplicate_of IS NULL`.

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{NewReviewEntry, PageId, Severity};

/// Default rolling-window size for duplicate matching (spec §4.6).
pub const DEFAULT_WINDOW_DAYS: i64 = 120;

/// A non-duplicate row already known to share `ticket_number` (and, when
/// the vendor was known, `vendor_id`) with the candidate ticket.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateCandidate {
    pub id: i64,
    pub ticket_date: NaiveDate,
}

impl DuplicateCandidate {
    pub fn new(id: i64, ticket_date: NaiveDate) -> Self {
        Self { id, ticket_date }
    }
}

/// A confirmed duplicate match (spec §4.6).
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub is_duplicate: bool,
    pub original_ticket_id: i64,
    pub original_ticket_date: NaiveDate,
    pub original_file_id: String,
    pub days_apart: i64,
    pub confidence: f32,
}

/// Find the duplicate, if any, for `ticket_date` among `candidates` already
/// restricted to the same ticket number (and vendor, if known).
///
/// Only candidates with `ticket_date ∈ [d-window, d]` are eligible. Among
/// those, the earliest `ticket_date` wins; ties break on the smallest `id`
/// (spec §4.6).
pub fn find_duplicate(
    candidates: &[DuplicateCandidate],
    ticket_date: NaiveDate,
    original_file_id: &str,
    vendor_known: bool,
    window_days: i64,
) -> Option<DuplicateMatch> {
    let floor = ticket_date - chrono::Duration::days(window_days);

    let best = candidates
        .iter()
        .filter(|c| c.ticket_date >= floor && c.ticket_date <= ticket_date)
        .min_by(|a, b| a.ticket_date.cmp(&b.ticket_date).then(a.id.cmp(&b.id)))?;

    let days_apart = (ticket_date - best.ticket_date).num_days();
    Some(DuplicateMatch {
        is_duplicate: true,
        original_ticket_id: best.id,
        original_ticket_date: best.ticket_date,
        original_file_id: original_file_id.to_string(),
        days_apart,
        confidence: if vendor_known { 1.0 } else { 0.85 },
    })
}

/// Fields to set on the incoming ticket when `find_duplicate` matched
/// (spec §4.6 `mark_as_duplicate`). The repository applies these to the
/// row it is about to (not) insert.
pub struct DuplicateMarking {
    pub duplicate_of: i64,
    pub review_required: bool,
    pub review_reason: String,
}

pub fn mark_as_duplicate(original_id: i64, reason: &str) -> DuplicateMarking {
    DuplicateMarking {
        duplicate_of: original_id,
        review_required: true,
        review_reason: reason.to_string(),
    }
}

/// Build the WARNING-severity `DUPLICATE_TICKET` review row (spec §4.6
/// `create_review_entry`).
pub fn create_review_entry(
    page_id: PageId,
    file_path: String,
    page_num: u32,
    matched: &DuplicateMatch,
    detected_fields: Value,
) -> NewReviewEntry {
    let suggested_fixes = serde_json::json!({
        "original_ticket_id": matched.original_ticket_id,
        "original_file_id": matched.original_file_id,
        "days_apart": matched.days_apart,
    });
    NewReviewEntry {
        ticket_id: None,
        page_id,
        reason: "DUPLICATE_TICKET".to_string(),
        severity: Severity::Warning,
        file_path,
        page_num,
        detected_fields,
        suggested_fixes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_candidates_means_no_duplicate() {
        assert!(find_duplicate(&[], date(2026, 7, 1), "f1", true, DEFAULT_WINDOW_DAYS).is_none());
    }

    #[test]
    fn candidate_outside_window_is_ignored() {
        let candidates = [DuplicateCandidate::new(1, date(2026, 1, 1))];
        assert!(find_duplicate(&candidates, date(2026, 7, 1), "f1", true, DEFAULT_WINDOW_DAYS).is_none());
    }

    #[test]
    fn candidate_inside_window_matches_with_full_confidence_when_vendor_known() {
        let candidates = [DuplicateCandidate::new(5, date(2026, 6, 1))];
        let matched = find_duplicate(&candidates, date(2026, 7, 1), "f2", true, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(matched.original_ticket_id, 5);
        assert_eq!(matched.days_apart, 30);
        assert_eq!(matched.confidence, 1.0);
    }

    #[test]
    fn unknown_vendor_yields_reduced_confidence() {
        let candidates = [DuplicateCandidate::new(5, date(2026, 6, 1))];
        let matched = find_duplicate(&candidates, date(2026, 7, 1), "f2", false, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(matched.confidence, 0.85);
    }

    #[test]
    fn tie_break_prefers_earliest_date_then_smallest_id() {
        let candidates = [
            DuplicateCandidate::new(9, date(2026, 6, 15)),
            DuplicateCandidate::new(3, date(2026, 6, 1)),
            DuplicateCandidate::new(4, date(2026, 6, 1)),
        ];
        let matched = find_duplicate(&candidates, date(2026, 7, 1), "f3", true, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(matched.original_ticket_id, 3);
    }

    #[test]
    fn mark_as_duplicate_sets_review_required() {
        let marking = mark_as_duplicate(5, "DUPLICATE_TICKET");
        assert_eq!(marking.duplicate_of, 5);
        assert!(marking.review_required);
        assert_eq!(marking.review_reason, "DUPLICATE_TICKET");
    }
}
