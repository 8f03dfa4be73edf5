//! CLI output formatting. Grounded on `cli/helpers.rs`'s thin `console`
//! styling wrappers around repository/domain types — no business logic
//! lives here, only presentation of what the core already computed.

use console::style;

use crate::batch::BatchResult;
use crate::models::{ProcessingRun, ReviewQueueEntry, RunStatus};

pub fn success(message: &str) -> String {
    format!("{} {}", style("\u{2713}").green().bold(), message)
}

fn status_styled(status: RunStatus) -> console::StyledObject<&'static str> {
    match status {
        RunStatus::Completed => style(status.as_str()).green(),
        RunStatus::Partial => style(status.as_str()).yellow(),
        RunStatus::Failed => style(status.as_str()).red().bold(),
        RunStatus::InProgress => style(status.as_str()).blue(),
    }
}

pub fn batch_summary(result: &BatchResult) -> String {
    format!(
        "{} run {} — {} files ({} ok, {} failed), {} pages, {} tickets, {} review entries, {} errors",
        status_styled(result.status),
        result.request_guid,
        result.files_total,
        result.files_succeeded,
        result.files_failed,
        result.counters.pages,
        result.counters.tickets_created,
        result.counters.review_queue_count,
        result.counters.error_count,
    )
}

pub fn review_line(entry: &ReviewQueueEntry) -> String {
    let severity = match entry.severity {
        crate::models::Severity::Critical => style(entry.severity.as_str()).red().bold(),
        crate::models::Severity::Warning => style(entry.severity.as_str()).yellow(),
        crate::models::Severity::Info => style(entry.severity.as_str()).dim(),
    };
    format!(
        "[{}] #{} {} page={} reason={}",
        severity, entry.id, entry.page_id, entry.page_num, entry.reason
    )
}

pub fn run_line(run: &ProcessingRun) -> String {
    format!(
        "{} {} by={} status={} files={} tickets={} review={} errors={}",
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        run.request_guid,
        run.processed_by,
        status_styled(run.status),
        run.counters.files,
        run.counters.tickets_created,
        run.counters.review_queue_count,
        run.counters.error_count,
    )
}
