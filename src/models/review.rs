//! Review-queue entities (spec §3 `ReviewQueueEntry`, C12).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Review-entry severity. Ordered so that `CRITICAL` sorts first in
/// severity-ordered exports (spec §4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// A page-identifying key: `{file_id}#{file_page}`, used to key review
/// entries and tie them back to the source page (spec §4.5 100%-recall
/// property, P1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    pub file_id: String,
    pub file_page: u32,
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file_id, self.file_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewQueueEntry {
    pub id: i64,
    pub ticket_id: Option<i64>,
    pub page_id: PageId,
    pub reason: String,
    pub severity: Severity,
    pub file_path: String,
    pub page_num: u32,
    pub detected_fields: Value,
    pub suggested_fixes: Value,
    pub resolved: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to write a new review entry. Entries are write-once from
/// the core; resolution fields are filled in externally.
#[derive(Debug, Clone)]
pub struct NewReviewEntry {
    pub ticket_id: Option<i64>,
    pub page_id: PageId,
    pub reason: String,
    pub severity: Severity,
    pub file_path: String,
    pub page_num: u32,
    pub detected_fields: Value,
    pub suggested_fixes: Value,
}
