//! `ProcessingRun` — the audit record for one batch invocation (spec §3, C11).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    InProgress,
    Completed,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "IN_PROGRESS",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Partial => "PARTIAL",
            RunStatus::Failed => "FAILED",
        }
    }

    /// Whether this status is terminal (spec I5: once left `IN_PROGRESS`,
    /// a run cannot transition again).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::InProgress)
    }
}

/// Monotonic counters tracked across a batch run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunCounters {
    pub files: u64,
    pub pages: u64,
    pub tickets_created: u64,
    pub tickets_updated: u64,
    pub duplicates_found: u64,
    pub review_queue_count: u64,
    pub error_count: u64,
}

impl RunCounters {
    pub fn merge(&mut self, other: &RunCounters) {
        self.files += other.files;
        self.pages += other.pages;
        self.tickets_created += other.tickets_created;
        self.tickets_updated += other.tickets_updated;
        self.duplicates_found += other.duplicates_found;
        self.review_queue_count += other.review_queue_count;
        self.error_count += other.error_count;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingRun {
    pub id: i64,
    pub request_guid: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub processed_by: String,
    pub status: RunStatus,
    pub config_snapshot: Value,
    pub counters: RunCounters,
}

/// Counters aggregated across every `COMPLETED` run (spec §4.11).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessingStatistics {
    pub completed_runs: u64,
    pub totals: RunCounters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_progress_is_nonterminal() {
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Partial.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn counters_merge_sums_fields() {
        let mut a = RunCounters {
            files: 1,
            pages: 2,
            tickets_created: 3,
            tickets_updated: 0,
            duplicates_found: 1,
            review_queue_count: 1,
            error_count: 0,
        };
        let b = RunCounters {
            files: 1,
            pages: 3,
            tickets_created: 2,
            tickets_updated: 1,
            duplicates_found: 0,
            review_queue_count: 2,
            error_count: 1,
        };
        a.merge(&b);
        assert_eq!(a.files, 2);
        assert_eq!(a.pages, 5);
        assert_eq!(a.tickets_created, 5);
        assert_eq!(a.tickets_updated, 1);
        assert_eq!(a.duplicates_found, 1);
        assert_eq!(a.review_queue_count, 3);
        assert_eq!(a.error_count, 1);
    }
}
