//! Ticket Repository (C7): the single atomic write path for a
//! [`TruckTicket`] row, composing the Reference Cache (C1), Manifest
//! Validator (C5), and Duplicate Detector (C6) ahead of the insert.
//!
//! Grounded on `repository/diesel_source.rs`'s create/search shape, with
//! the FK-resolve -> validate -> dedupe -> insert sequence lifted from
//! spec §4.7 into `TicketRepository::create`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::convert::{format_date, format_datetime, parse_date, parse_datetime};
use super::pool::{DbError, DbPool};
use super::reference::ReferenceRepository;
use crate::cache::ReferenceCache;
use crate::duplicate::{self, DuplicateCandidate};
use crate::error::TicketError;
use crate::models::{NewTicket, QuantityUnit, TruckTicket};
use crate::schema::truck_tickets;
use crate::validate;
use crate::with_conn;

/// Per-call knobs for [`TicketRepository::create`] (spec §4.7).
#[derive(Debug, Clone, Copy)]
pub struct CreateOptions {
    pub validate_manifest: bool,
    pub check_duplicates: bool,
    pub duplicate_window_days: i64,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            validate_manifest: true,
            check_duplicates: true,
            duplicate_window_days: duplicate::DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Queryable)]
struct TruckTicketRow {
    id: i32,
    ticket_number: String,
    ticket_date: String,
    job_id: i32,
    material_id: i32,
    ticket_type_id: i32,
    source_id: Option<i32>,
    destination_id: Option<i32>,
    vendor_id: Option<i32>,
    quantity: String,
    quantity_unit: String,
    truck_number: Option<String>,
    manifest_number: Option<String>,
    file_id: String,
    file_page: i32,
    file_hash: String,
    request_guid: String,
    confidence_score: f32,
    processed_by: String,
    review_required: i32,
    review_reason: Option<String>,
    duplicate_of: Option<i32>,
    created_at: String,
    updated_at: String,
}

impl From<TruckTicketRow> for TruckTicket {
    fn from(row: TruckTicketRow) -> Self {
        TruckTicket {
            id: row.id as i64,
            ticket_number: row.ticket_number,
            ticket_date: parse_date(&row.ticket_date),
            job_id: row.job_id as i64,
            material_id: row.material_id as i64,
            ticket_type_id: row.ticket_type_id as i64,
            source_id: row.source_id.map(|v| v as i64),
            destination_id: row.destination_id.map(|v| v as i64),
            vendor_id: row.vendor_id.map(|v| v as i64),
            quantity: row.quantity.parse().unwrap_or_default(),
            quantity_unit: QuantityUnit::parse(&row.quantity_unit).unwrap_or(QuantityUnit::Loads),
            truck_number: row.truck_number,
            manifest_number: row.manifest_number,
            file_id: row.file_id,
            file_page: row.file_page as u32,
            file_hash: row.file_hash,
            request_guid: row.request_guid,
            confidence_score: row.confidence_score,
            processed_by: row.processed_by,
            review_required: super::convert::int_to_bool(row.review_required),
            review_reason: row.review_reason,
            duplicate_of: row.duplicate_of.map(|v| v as i64),
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

#[derive(Clone)]
pub struct TicketRepository {
    pool: DbPool,
}

impl TicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve the FKs a new ticket needs, failing with `ForeignKey` on a
    /// required miss and leaving optional FKs `None` on a miss (spec §4.7
    /// steps 1-2).
    async fn resolve_foreign_keys(
        &self,
        new_ticket: &NewTicket,
        cache: &mut ReferenceCache,
        reference: &ReferenceRepository,
    ) -> Result<(i64, i64, i64, Option<i64>, Option<i64>, Option<i64>), TicketError> {
        let job = cache
            .get_job_by_name(&new_ticket.job_name, |name| reference.find_job_by_name(name))
            .await?
            .ok_or_else(|| TicketError::ForeignKey { field: "job_name", value: new_ticket.job_name.clone() })?;

        let material = cache
            .get_material_by_name(&new_ticket.material_name, |name| reference.find_material_by_name(name))
            .await?
            .ok_or_else(|| TicketError::ForeignKey {
                field: "material_name",
                value: new_ticket.material_name.clone(),
            })?;

        let ticket_type = cache
            .get_ticket_type_by_name(new_ticket.ticket_type.as_str(), |name| {
                reference.find_ticket_type_by_name(name)
            })
            .await?
            .ok_or_else(|| TicketError::ForeignKey {
                field: "ticket_type",
                value: new_ticket.ticket_type.as_str().to_string(),
            })?;

        let source_id = match &new_ticket.source_name {
            Some(name) => cache.get_source_by_name(name, |n| reference.find_source_by_name(n)).await?.map(|s| s.id),
            None => None,
        };
        let destination_id = match &new_ticket.destination_name {
            Some(name) => cache
                .get_destination_by_name(name, |n| reference.find_destination_by_name(n))
                .await?
                .map(|d| d.id),
            None => None,
        };
        let vendor_id = match &new_ticket.vendor_name {
            Some(name) => cache.get_vendor_by_name(name, |n| reference.find_vendor_by_name(n)).await?.map(|v| v.id),
            None => None,
        };

        Ok((job.id, material.id, ticket_type.id, source_id, destination_id, vendor_id))
    }

    /// The atomic `create` unit of work described in spec §4.7: resolve FKs,
    /// validate the manifest, check for duplicates, then insert.
    pub async fn create(
        &self,
        new_ticket: NewTicket,
        options: CreateOptions,
        cache: &mut ReferenceCache,
        reference: &ReferenceRepository,
    ) -> Result<TruckTicket, TicketError> {
        let (job_id, material_id, ticket_type_id, source_id, destination_id, vendor_id) =
            self.resolve_foreign_keys(&new_ticket, cache, reference).await?;

        if options.validate_manifest {
            let material = cache
                .get_material_by_name(&new_ticket.material_name, |n| reference.find_material_by_name(n))
                .await?;
            let destination = match &new_ticket.destination_name {
                Some(name) => cache.get_destination_by_name(name, |n| reference.find_destination_by_name(n)).await?,
                None => None,
            };
            let result = validate::validate_manifest(
                material.as_ref().map(|m| m.name.as_str()),
                destination.as_ref().map(|d| d.name.as_str()),
                new_ticket.manifest_number.as_deref(),
            );
            if !result.is_valid {
                return Err(TicketError::Validation(result));
            }
        }

        if options.check_duplicates {
            let candidates = self
                .get_candidates_for_duplicate_check(
                    &new_ticket.ticket_number,
                    new_ticket.ticket_date,
                    vendor_id,
                    options.duplicate_window_days,
                )
                .await?;
            if let Some(matched) = duplicate::find_duplicate(
                &candidates,
                new_ticket.ticket_date,
                &new_ticket.file_id,
                vendor_id.is_some(),
                options.duplicate_window_days,
            ) {
                return Err(TicketError::Duplicate(matched));
            }
        }

        let ticket_date = format_date(new_ticket.ticket_date);
        let now = format_datetime(chrono::Utc::now());
        let quantity = new_ticket.quantity.to_string();
        let file_page = new_ticket.file_page as i32;
        let source_id_i32 = source_id.map(|v| v as i32);
        let destination_id_i32 = destination_id.map(|v| v as i32);
        let vendor_id_i32 = vendor_id.map(|v| v as i32);

        let id: Result<i32, DbError> = with_conn!(self.pool, conn => {
            diesel::insert_into(truck_tickets::table)
                .values((
                    truck_tickets::ticket_number.eq(&new_ticket.ticket_number),
                    truck_tickets::ticket_date.eq(&ticket_date),
                    truck_tickets::job_id.eq(job_id as i32),
                    truck_tickets::material_id.eq(material_id as i32),
                    truck_tickets::ticket_type_id.eq(ticket_type_id as i32),
                    truck_tickets::source_id.eq(source_id_i32),
                    truck_tickets::destination_id.eq(destination_id_i32),
                    truck_tickets::vendor_id.eq(vendor_id_i32),
                    truck_tickets::quantity.eq(&quantity),
                    truck_tickets::quantity_unit.eq(new_ticket.quantity_unit.as_str()),
                    truck_tickets::truck_number.eq(&new_ticket.truck_number),
                    truck_tickets::manifest_number.eq(&new_ticket.manifest_number),
                    truck_tickets::file_id.eq(&new_ticket.file_id),
                    truck_tickets::file_page.eq(file_page),
                    truck_tickets::file_hash.eq(&new_ticket.file_hash),
                    truck_tickets::request_guid.eq(&new_ticket.request_guid),
                    truck_tickets::confidence_score.eq(new_ticket.confidence_score),
                    truck_tickets::processed_by.eq(&new_ticket.processed_by),
                    truck_tickets::review_required.eq(0),
                    truck_tickets::created_at.eq(&now),
                    truck_tickets::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await?;
            truck_tickets::table
                .filter(truck_tickets::file_id.eq(&new_ticket.file_id))
                .filter(truck_tickets::file_page.eq(file_page))
                .select(truck_tickets::id)
                .first::<i32>(&mut conn)
                .await
        });
        let id = id.map_err(TicketError::Repository)?;

        self.get_by_id(id as i64).await.map_err(TicketError::Repository)?.ok_or_else(|| {
            TicketError::Processing("ticket vanished immediately after insert".to_string())
        })
    }

    /// Candidate rows for duplicate detection (spec §4.6): live
    /// (non-duplicate) tickets with the same `ticket_number` (and, when
    /// known, the same `vendor_id`) within the window, oldest-dated first.
    async fn get_candidates_for_duplicate_check(
        &self,
        ticket_number: &str,
        ticket_date: chrono::NaiveDate,
        vendor_id: Option<i64>,
        window_days: i64,
    ) -> Result<Vec<DuplicateCandidate>, DbError> {
        let earliest = format_date(ticket_date - chrono::Duration::days(window_days));
        let latest = format_date(ticket_date);
        let vendor_id = vendor_id.map(|v| v as i32);
        with_conn!(self.pool, conn => {
            let mut query = truck_tickets::table
                .filter(truck_tickets::duplicate_of.is_null())
                .filter(truck_tickets::ticket_number.eq(ticket_number))
                .filter(truck_tickets::ticket_date.ge(&earliest))
                .filter(truck_tickets::ticket_date.le(&latest))
                .into_boxed();
            if let Some(vendor_id) = vendor_id {
                query = query.filter(truck_tickets::vendor_id.eq(vendor_id));
            }
            query
                .select((truck_tickets::id, truck_tickets::ticket_date))
                .load::<(i32, String)>(&mut conn)
                .await
                .map(|rows| {
                    rows.into_iter()
                        .map(|(id, date)| DuplicateCandidate::new(id as i64, parse_date(&date)))
                        .collect()
                })
        })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<TruckTicket>, DbError> {
        let id = id as i32;
        with_conn!(self.pool, conn => {
            truck_tickets::table
                .filter(truck_tickets::id.eq(id))
                .first::<TruckTicketRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(TruckTicket::from))
        })
    }

    pub async fn get_by_ticket_number(
        &self,
        ticket_number: &str,
        vendor_id: Option<i64>,
    ) -> Result<Vec<TruckTicket>, DbError> {
        let vendor_id = vendor_id.map(|v| v as i32);
        with_conn!(self.pool, conn => {
            let mut query = truck_tickets::table.filter(truck_tickets::ticket_number.eq(ticket_number)).into_boxed();
            if let Some(vendor_id) = vendor_id {
                query = query.filter(truck_tickets::vendor_id.eq(vendor_id));
            }
            query.load::<TruckTicketRow>(&mut conn).await.map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    /// Live (non-duplicate) tickets carrying `file_hash` (C8's whole-file
    /// duplicate check, spec §4.8).
    pub async fn get_by_file_hash(&self, file_hash: &str) -> Result<Vec<TruckTicket>, DbError> {
        with_conn!(self.pool, conn => {
            truck_tickets::table
                .filter(truck_tickets::file_hash.eq(file_hash))
                .filter(truck_tickets::duplicate_of.is_null())
                .load::<TruckTicketRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    pub async fn get_by_date_range(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        job_id: Option<i64>,
    ) -> Result<Vec<TruckTicket>, DbError> {
        let start = format_date(start);
        let end = format_date(end);
        let job_id = job_id.map(|v| v as i32);
        with_conn!(self.pool, conn => {
            let mut query = truck_tickets::table
                .filter(truck_tickets::ticket_date.ge(&start))
                .filter(truck_tickets::ticket_date.le(&end))
                .into_boxed();
            if let Some(job_id) = job_id {
                query = query.filter(truck_tickets::job_id.eq(job_id));
            }
            query.load::<TruckTicketRow>(&mut conn).await.map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    pub async fn count_by_job(&self, job_id: i64) -> Result<i64, DbError> {
        let job_id = job_id as i32;
        with_conn!(self.pool, conn => {
            truck_tickets::table.filter(truck_tickets::job_id.eq(job_id)).count().get_result(&mut conn).await
        })
    }

    pub async fn get_duplicates(&self) -> Result<Vec<TruckTicket>, DbError> {
        with_conn!(self.pool, conn => {
            truck_tickets::table
                .filter(truck_tickets::duplicate_of.is_not_null())
                .load::<TruckTicketRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    pub async fn get_requiring_review(&self) -> Result<Vec<TruckTicket>, DbError> {
        with_conn!(self.pool, conn => {
            truck_tickets::table
                .filter(truck_tickets::review_required.eq(1))
                .load::<TruckTicketRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    /// Filterable search over live tickets (spec §4.7): ticket-number
    /// substring, FK filters, date range, manifest-present flag, row limit.
    #[allow(clippy::too_many_arguments)]
    pub async fn search(
        &self,
        ticket_number_like: Option<&str>,
        job_id: Option<i64>,
        material_id: Option<i64>,
        vendor_id: Option<i64>,
        date_range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
        has_manifest: Option<bool>,
        limit: i64,
    ) -> Result<Vec<TruckTicket>, DbError> {
        let job_id = job_id.map(|v| v as i32);
        let material_id = material_id.map(|v| v as i32);
        let vendor_id = vendor_id.map(|v| v as i32);
        let date_range = date_range.map(|(s, e)| (format_date(s), format_date(e)));
        let like_pattern = ticket_number_like.map(|s| format!("%{s}%"));

        with_conn!(self.pool, conn => {
            let mut query = truck_tickets::table.into_boxed();
            if let Some(pattern) = &like_pattern {
                query = query.filter(truck_tickets::ticket_number.like(pattern.as_str()));
            }
            if let Some(job_id) = job_id {
                query = query.filter(truck_tickets::job_id.eq(job_id));
            }
            if let Some(material_id) = material_id {
                query = query.filter(truck_tickets::material_id.eq(material_id));
            }
            if let Some(vendor_id) = vendor_id {
                query = query.filter(truck_tickets::vendor_id.eq(vendor_id));
            }
            if let Some((start, end)) = &date_range {
                query = query.filter(truck_tickets::ticket_date.ge(start)).filter(truck_tickets::ticket_date.le(end));
            }
            match has_manifest {
                Some(true) => query = query.filter(truck_tickets::manifest_number.is_not_null()),
                Some(false) => query = query.filter(truck_tickets::manifest_number.is_null()),
                None => {}
            }
            query.limit(limit).load::<TruckTicketRow>(&mut conn).await.map(|rows| rows.into_iter().map(TruckTicket::from).collect())
        })
    }

    /// Mark a ticket as a duplicate of `original_id` (C6's `mark_as_duplicate`
    /// mutation, persisted).
    pub async fn mark_as_duplicate(&self, ticket_id: i64, original_id: i64, reason: &str) -> Result<(), DbError> {
        let ticket_id = ticket_id as i32;
        let original_id = original_id as i32;
        let now = format_datetime(chrono::Utc::now());
        with_conn!(self.pool, conn => {
            diesel::update(truck_tickets::table.filter(truck_tickets::id.eq(ticket_id)))
                .set((
                    truck_tickets::duplicate_of.eq(original_id),
                    truck_tickets::review_required.eq(1),
                    truck_tickets::review_reason.eq(reason),
                    truck_tickets::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await
                .map(|_| ())
        })
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), DbError> {
        let id = id as i32;
        let now = format_datetime(chrono::Utc::now());
        with_conn!(self.pool, conn => {
            diesel::update(truck_tickets::table.filter(truck_tickets::id.eq(id)))
                .set((truck_tickets::review_required.eq(1), truck_tickets::updated_at.eq(&now)))
                .execute(&mut conn)
                .await
                .map(|_| ())
        })
    }

    pub async fn hard_delete(&self, id: i64) -> Result<(), DbError> {
        let id = id as i32;
        with_conn!(self.pool, conn => {
            diesel::delete(truck_tickets::table.filter(truck_tickets::id.eq(id))).execute(&mut conn).await.map(|_| ())
        })
    }
}
