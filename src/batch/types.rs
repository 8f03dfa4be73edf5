//! Batch orchestrator configuration, events, and results (spec §4.10).

use std::time::Duration;

use crate::models::{RunCounters, RunStatus};

/// Per-call knobs for [`super::run_batch`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// `None` defaults to host parallelism (spec §5).
    pub max_workers: Option<usize>,
    pub chunk_size: usize,
    pub timeout_per_file: Duration,
    pub retry_attempts: u32,
    pub continue_on_error: bool,
    pub rollback_on_critical: bool,
    /// Whole-file duplicate short-circuit (C8, spec §4.8) ahead of OCR.
    pub check_duplicate_files: bool,
    /// Extension-only glob, e.g. `*.pdf`.
    pub glob_pattern: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            chunk_size: 1,
            timeout_per_file: Duration::from_secs(120),
            retry_attempts: 2,
            continue_on_error: true,
            rollback_on_critical: true,
            check_duplicate_files: true,
            glob_pattern: "*.pdf".to_string(),
        }
    }
}

/// Progress events emitted while a batch runs, one per completed file.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    FileCompleted { path: String },
    FileFailed { path: String, reason: String },
    FileTimedOut { path: String, reason: String },
}

/// Per-file page counters accumulated by [`super::process_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOutcome {
    pub pages: u64,
    pub tickets_created: u64,
    pub review_queue_count: u64,
    pub errors: u64,
}

/// Terminal summary of one batch run.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub status: RunStatus,
    pub request_guid: String,
    pub files_total: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub counters: RunCounters,
}
