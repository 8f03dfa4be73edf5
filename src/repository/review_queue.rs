//! Review Queue Writer (C12): write-once persistence of [`NewReviewEntry`]
//! rows produced anywhere in the pipeline — field extraction, manifest
//! validation, duplicate detection, preflight.
//!
//! Grounded on `repository/diesel_source.rs`'s insert/list shape; the
//! table itself never updates rows written by the core, only resolution
//! fields set externally (spec §4.12).

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;

use super::convert::{parse_datetime, parse_datetime_opt};
use super::pool::{DbError, DbPool};
use crate::models::{PageId, ReviewQueueEntry, Severity};
use crate::models::NewReviewEntry;
use crate::schema::review_queue_entries;
use crate::with_conn;

fn parse_severity(raw: &str) -> Severity {
    match raw {
        "CRITICAL" => Severity::Critical,
        "WARNING" => Severity::Warning,
        _ => Severity::Info,
    }
}

fn parse_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

#[derive(Queryable)]
struct ReviewQueueRow {
    id: i32,
    ticket_id: Option<i32>,
    file_id: String,
    file_page: i32,
    reason: String,
    severity: String,
    file_path: String,
    page_num: i32,
    detected_fields: String,
    suggested_fixes: String,
    resolved: i32,
    resolved_by: Option<String>,
    resolved_at: Option<String>,
    created_at: String,
}

impl From<ReviewQueueRow> for ReviewQueueEntry {
    fn from(row: ReviewQueueRow) -> Self {
        ReviewQueueEntry {
            id: row.id as i64,
            ticket_id: row.ticket_id.map(|v| v as i64),
            page_id: PageId { file_id: row.file_id, file_page: row.file_page as u32 },
            reason: row.reason,
            severity: parse_severity(&row.severity),
            file_path: row.file_path,
            page_num: row.page_num as u32,
            detected_fields: parse_json(&row.detected_fields),
            suggested_fixes: parse_json(&row.suggested_fixes),
            resolved: super::convert::int_to_bool(row.resolved),
            resolved_by: row.resolved_by,
            resolved_at: parse_datetime_opt(row.resolved_at),
            created_at: parse_datetime(&row.created_at),
        }
    }
}

#[derive(Clone)]
pub struct ReviewQueueRepository {
    pool: DbPool,
}

impl ReviewQueueRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new entry. Never fails the caller's unit of work: insertion
    /// errors are the caller's concern, but the entry itself carries no
    /// validation beyond what its fields already encode.
    pub async fn insert(&self, entry: &NewReviewEntry) -> Result<i64, DbError> {
        let detected_fields = entry.detected_fields.to_string();
        let suggested_fixes = entry.suggested_fixes.to_string();
        let created_at = super::convert::format_datetime(chrono::Utc::now());
        let ticket_id = entry.ticket_id.map(|v| v as i32);
        let file_page = entry.page_id.file_page as i32;
        let page_num = entry.page_num as i32;

        with_conn!(self.pool, conn => {
            diesel::insert_into(review_queue_entries::table)
                .values((
                    review_queue_entries::ticket_id.eq(ticket_id),
                    review_queue_entries::file_id.eq(&entry.page_id.file_id),
                    review_queue_entries::file_page.eq(file_page),
                    review_queue_entries::reason.eq(&entry.reason),
                    review_queue_entries::severity.eq(entry.severity.as_str()),
                    review_queue_entries::file_path.eq(&entry.file_path),
                    review_queue_entries::page_num.eq(page_num),
                    review_queue_entries::detected_fields.eq(&detected_fields),
                    review_queue_entries::suggested_fixes.eq(&suggested_fixes),
                    review_queue_entries::resolved.eq(0),
                    review_queue_entries::created_at.eq(&created_at),
                ))
                .execute(&mut conn)
                .await?;
            review_queue_entries::table
                .order(review_queue_entries::id.desc())
                .select(review_queue_entries::id)
                .first::<i32>(&mut conn)
                .await
                .map(|id| id as i64)
        })
    }

    pub async fn get_unresolved(&self) -> Result<Vec<ReviewQueueEntry>, DbError> {
        with_conn!(self.pool, conn => {
            review_queue_entries::table
                .filter(review_queue_entries::resolved.eq(0))
                .order(review_queue_entries::severity.asc())
                .load::<ReviewQueueRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(ReviewQueueEntry::from).collect())
        })
    }

    pub async fn get_for_page(&self, file_id: &str, file_page: u32) -> Result<Vec<ReviewQueueEntry>, DbError> {
        let page = file_page as i32;
        with_conn!(self.pool, conn => {
            review_queue_entries::table
                .filter(review_queue_entries::file_id.eq(file_id))
                .filter(review_queue_entries::file_page.eq(page))
                .load::<ReviewQueueRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(ReviewQueueEntry::from).collect())
        })
    }

    pub async fn resolve(&self, id: i64, resolved_by: &str) -> Result<(), DbError> {
        let resolved_at = super::convert::format_datetime(chrono::Utc::now());
        let id = id as i32;
        with_conn!(self.pool, conn => {
            diesel::update(review_queue_entries::table.filter(review_queue_entries::id.eq(id)))
                .set((
                    review_queue_entries::resolved.eq(1),
                    review_queue_entries::resolved_by.eq(resolved_by),
                    review_queue_entries::resolved_at.eq(&resolved_at),
                ))
                .execute(&mut conn)
                .await
                .map(|_| ())
        })
    }
}
