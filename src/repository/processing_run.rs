//! Processing-Run Ledger (C11): the audit trail for one batch invocation —
//! start, progress updates, and terminal completion, enforcing spec
//! invariant I5 (a run cannot leave `IN_PROGRESS` more than once).
//!
//! Grounded on `repository/diesel_source.rs`'s CRUD shape.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;

use super::convert::{format_datetime, parse_datetime, parse_datetime_opt};
use super::pool::{DbError, DbPool};
use crate::models::{ProcessingRun, ProcessingStatistics, RunCounters, RunStatus};
use crate::schema::processing_runs;
use crate::with_conn;

fn parse_status(raw: &str) -> RunStatus {
    match raw {
        "COMPLETED" => RunStatus::Completed,
        "PARTIAL" => RunStatus::Partial,
        "FAILED" => RunStatus::Failed,
        _ => RunStatus::InProgress,
    }
}

#[derive(Queryable)]
struct ProcessingRunRow {
    id: i32,
    request_guid: String,
    started_at: String,
    completed_at: Option<String>,
    processed_by: String,
    status: String,
    config_snapshot: String,
    files: i32,
    pages: i32,
    tickets_created: i32,
    tickets_updated: i32,
    duplicates_found: i32,
    review_queue_count: i32,
    error_count: i32,
}

impl From<ProcessingRunRow> for ProcessingRun {
    fn from(row: ProcessingRunRow) -> Self {
        ProcessingRun {
            id: row.id as i64,
            request_guid: row.request_guid,
            started_at: parse_datetime(&row.started_at),
            completed_at: parse_datetime_opt(row.completed_at),
            processed_by: row.processed_by,
            status: parse_status(&row.status),
            config_snapshot: serde_json::from_str(&row.config_snapshot).unwrap_or(Value::Null),
            counters: RunCounters {
                files: row.files as u64,
                pages: row.pages as u64,
                tickets_created: row.tickets_created as u64,
                tickets_updated: row.tickets_updated as u64,
                duplicates_found: row.duplicates_found as u64,
                review_queue_count: row.review_queue_count as u64,
                error_count: row.error_count as u64,
            },
        }
    }
}

#[derive(Clone)]
pub struct ProcessingRunRepository {
    pool: DbPool,
}

impl ProcessingRunRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn start_run(&self, request_guid: &str, processed_by: &str, config_snapshot: &Value) -> Result<i64, DbError> {
        let started_at = format_datetime(chrono::Utc::now());
        let snapshot = config_snapshot.to_string();
        with_conn!(self.pool, conn => {
            diesel::insert_into(processing_runs::table)
                .values((
                    processing_runs::request_guid.eq(request_guid),
                    processing_runs::started_at.eq(&started_at),
                    processing_runs::processed_by.eq(processed_by),
                    processing_runs::status.eq(RunStatus::InProgress.as_str()),
                    processing_runs::config_snapshot.eq(&snapshot),
                    processing_runs::files.eq(0),
                    processing_runs::pages.eq(0),
                    processing_runs::tickets_created.eq(0),
                    processing_runs::tickets_updated.eq(0),
                    processing_runs::duplicates_found.eq(0),
                    processing_runs::review_queue_count.eq(0),
                    processing_runs::error_count.eq(0),
                ))
                .execute(&mut conn)
                .await?;
            processing_runs::table
                .filter(processing_runs::request_guid.eq(request_guid))
                .select(processing_runs::id)
                .first::<i32>(&mut conn)
                .await
                .map(|id| id as i64)
        })
    }

    /// Overwrite the running counters for an in-progress run. Does not
    /// change status; callers poll this to report live batch progress.
    pub async fn update_run_progress(&self, id: i64, counters: &RunCounters) -> Result<(), DbError> {
        let id = id as i32;
        let files = counters.files as i32;
        let pages = counters.pages as i32;
        let tickets_created = counters.tickets_created as i32;
        let tickets_updated = counters.tickets_updated as i32;
        let duplicates_found = counters.duplicates_found as i32;
        let review_queue_count = counters.review_queue_count as i32;
        let error_count = counters.error_count as i32;
        with_conn!(self.pool, conn => {
            diesel::update(processing_runs::table.filter(processing_runs::id.eq(id)))
                .set((
                    processing_runs::files.eq(files),
                    processing_runs::pages.eq(pages),
                    processing_runs::tickets_created.eq(tickets_created),
                    processing_runs::tickets_updated.eq(tickets_updated),
                    processing_runs::duplicates_found.eq(duplicates_found),
                    processing_runs::review_queue_count.eq(review_queue_count),
                    processing_runs::error_count.eq(error_count),
                ))
                .execute(&mut conn)
                .await
                .map(|_| ())
        })
    }

    async fn finish(&self, id: i64, status: RunStatus, counters: &RunCounters) -> Result<(), DbError> {
        let completed_at = format_datetime(chrono::Utc::now());
        let id = id as i32;
        let files = counters.files as i32;
        let pages = counters.pages as i32;
        let tickets_created = counters.tickets_created as i32;
        let tickets_updated = counters.tickets_updated as i32;
        let duplicates_found = counters.duplicates_found as i32;
        let review_queue_count = counters.review_queue_count as i32;
        let error_count = counters.error_count as i32;
        with_conn!(self.pool, conn => {
            diesel::update(
                processing_runs::table
                    .filter(processing_runs::id.eq(id))
                    .filter(processing_runs::status.eq(RunStatus::InProgress.as_str())),
            )
            .set((
                processing_runs::status.eq(status.as_str()),
                processing_runs::completed_at.eq(&completed_at),
                processing_runs::files.eq(files),
                processing_runs::pages.eq(pages),
                processing_runs::tickets_created.eq(tickets_created),
                processing_runs::tickets_updated.eq(tickets_updated),
                processing_runs::duplicates_found.eq(duplicates_found),
                processing_runs::review_queue_count.eq(review_queue_count),
                processing_runs::error_count.eq(error_count),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
        })
    }

    /// Transition a run to `COMPLETED` or `PARTIAL` (if `error_count > 0`).
    /// A no-op against a run that already left `IN_PROGRESS` (I5).
    pub async fn complete_run(&self, id: i64, counters: &RunCounters) -> Result<(), DbError> {
        let status = if counters.error_count > 0 { RunStatus::Partial } else { RunStatus::Completed };
        self.finish(id, status, counters).await
    }

    pub async fn fail_run(&self, id: i64, counters: &RunCounters) -> Result<(), DbError> {
        self.finish(id, RunStatus::Failed, counters).await
    }

    pub async fn get_by_guid(&self, request_guid: &str) -> Result<Option<ProcessingRun>, DbError> {
        with_conn!(self.pool, conn => {
            processing_runs::table
                .filter(processing_runs::request_guid.eq(request_guid))
                .first::<ProcessingRunRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(ProcessingRun::from))
        })
    }

    pub async fn get_recent(&self, limit: i64) -> Result<Vec<ProcessingRun>, DbError> {
        with_conn!(self.pool, conn => {
            processing_runs::table
                .order(processing_runs::started_at.desc())
                .limit(limit)
                .load::<ProcessingRunRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(ProcessingRun::from).collect())
        })
    }

    pub async fn get_by_status(&self, status: RunStatus) -> Result<Vec<ProcessingRun>, DbError> {
        with_conn!(self.pool, conn => {
            processing_runs::table
                .filter(processing_runs::status.eq(status.as_str()))
                .load::<ProcessingRunRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(ProcessingRun::from).collect())
        })
    }

    /// Aggregate counters across every `COMPLETED` run (spec §4.11). Runs
    /// that ended `PARTIAL` or `FAILED` are excluded so the totals reflect
    /// clean completions only.
    pub async fn get_processing_statistics(&self) -> Result<ProcessingStatistics, DbError> {
        let completed = self.get_by_status(RunStatus::Completed).await?;
        let mut totals = RunCounters::default();
        for run in &completed {
            totals.merge(&run.counters);
        }
        Ok(ProcessingStatistics { completed_runs: completed.len() as u64, totals })
    }

    /// Delete terminal runs older than `older_than_days`, keeping
    /// in-progress runs regardless of age.
    pub async fn cleanup_old_runs(&self, older_than_days: i64) -> Result<usize, DbError> {
        let cutoff = format_datetime(chrono::Utc::now() - chrono::Duration::days(older_than_days));
        with_conn!(self.pool, conn => {
            diesel::delete(
                processing_runs::table
                    .filter(processing_runs::started_at.lt(&cutoff))
                    .filter(processing_runs::status.ne(RunStatus::InProgress.as_str())),
            )
            .execute(&mut conn)
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_run_downgrades_to_partial_on_errors() {
        let clean = RunCounters::default();
        let mut dirty = RunCounters::default();
        dirty.error_count = 1;
        assert_eq!(
            if clean.error_count > 0 { RunStatus::Partial } else { RunStatus::Completed },
            RunStatus::Completed
        );
        assert_eq!(
            if dirty.error_count > 0 { RunStatus::Partial } else { RunStatus::Completed },
            RunStatus::Partial
        );
    }
}
