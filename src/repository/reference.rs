//! Reference-entity repositories (Job, Material, Source, Destination,
//! Vendor, TicketType) — the backing store for the Reference Cache (C1)
//! loader closures.
//!
//! Grounded on `repository/diesel_source.rs`'s find/list/save shape,
//! adapted to the schema's plain-integer surrogate keys.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::convert::{format_date, int_to_bool, parse_date};
use super::pool::{DbError, DbPool};
use crate::models::{Destination, Job, Material, MaterialClass, Source, TicketType, TicketTypeName, Vendor};
use crate::schema::{destinations, jobs, materials, sources, ticket_types, vendors};
use crate::with_conn;

#[derive(Queryable)]
struct JobRow {
    id: i32,
    code: String,
    name: String,
    start_date: String,
    end_date: Option<String>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id as i64,
            code: row.code,
            name: row.name,
            start_date: parse_date(&row.start_date),
            end_date: row.end_date.as_deref().map(parse_date),
        }
    }
}

#[derive(Queryable)]
struct MaterialRow {
    id: i32,
    name: String,
    class: String,
    requires_manifest: i32,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id as i64,
            name: row.name,
            class: MaterialClass::parse(&row.class).unwrap_or(MaterialClass::Contaminated),
            requires_manifest: int_to_bool(row.requires_manifest),
        }
    }
}

#[derive(Queryable)]
struct SourceRow {
    id: i32,
    name: String,
    job_id: Option<i32>,
    description: Option<String>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id as i64,
            name: row.name,
            job_id: row.job_id.map(|v| v as i64),
            description: row.description,
        }
    }
}

#[derive(Queryable)]
struct DestinationRow {
    id: i32,
    name: String,
    facility_type: Option<String>,
    address: Option<String>,
    requires_manifest: i32,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Destination {
            id: row.id as i64,
            name: row.name,
            facility_type: row.facility_type,
            address: row.address,
            requires_manifest: int_to_bool(row.requires_manifest),
        }
    }
}

#[derive(Queryable)]
struct VendorRow {
    id: i32,
    name: String,
    code: Option<String>,
    contact_info: Option<String>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor { id: row.id as i64, name: row.name, code: row.code, contact_info: row.contact_info }
    }
}

#[derive(Queryable)]
struct TicketTypeRow {
    id: i32,
    name: String,
}

impl From<TicketTypeRow> for TicketType {
    fn from(row: TicketTypeRow) -> Self {
        TicketType { id: row.id as i64, name: TicketTypeName::parse(&row.name).unwrap_or(TicketTypeName::Export) }
    }
}

/// Read/write access to the six reference tables.
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: DbPool,
}

impl ReferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_job_by_name(&self, name: &str) -> Result<Option<Job>, DbError> {
        with_conn!(self.pool, conn => {
            jobs::table
                .filter(jobs::name.eq(name))
                .first::<JobRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Job::from))
        })
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, DbError> {
        with_conn!(self.pool, conn => {
            jobs::table.load::<JobRow>(&mut conn).await.map(|rows| rows.into_iter().map(Job::from).collect())
        })
    }

    pub async fn insert_job(&self, job: &Job) -> Result<i64, DbError> {
        let start = format_date(job.start_date);
        let end = job.end_date.map(format_date);
        with_conn!(self.pool, conn => {
            diesel::insert_into(jobs::table)
                .values((jobs::code.eq(&job.code), jobs::name.eq(&job.name), jobs::start_date.eq(&start), jobs::end_date.eq(&end)))
                .execute(&mut conn)
                .await?;
            jobs::table.filter(jobs::code.eq(&job.code)).select(jobs::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }

    pub async fn find_material_by_name(&self, name: &str) -> Result<Option<Material>, DbError> {
        with_conn!(self.pool, conn => {
            materials::table
                .filter(materials::name.eq(name))
                .first::<MaterialRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Material::from))
        })
    }

    pub async fn list_materials(&self) -> Result<Vec<Material>, DbError> {
        with_conn!(self.pool, conn => {
            materials::table.load::<MaterialRow>(&mut conn).await.map(|rows| rows.into_iter().map(Material::from).collect())
        })
    }

    pub async fn insert_material(&self, material: &Material) -> Result<i64, DbError> {
        let requires_manifest = int_to_bool as fn(i32) -> bool;
        let _ = requires_manifest;
        with_conn!(self.pool, conn => {
            diesel::insert_into(materials::table)
                .values((
                    materials::name.eq(&material.name),
                    materials::class.eq(material.class.as_str()),
                    materials::requires_manifest.eq(super::convert::bool_to_int(material.requires_manifest)),
                ))
                .execute(&mut conn)
                .await?;
            materials::table.filter(materials::name.eq(&material.name)).select(materials::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }

    pub async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>, DbError> {
        with_conn!(self.pool, conn => {
            sources::table
                .filter(sources::name.eq(name))
                .first::<SourceRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Source::from))
        })
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>, DbError> {
        with_conn!(self.pool, conn => {
            sources::table.load::<SourceRow>(&mut conn).await.map(|rows| rows.into_iter().map(Source::from).collect())
        })
    }

    pub async fn insert_source(&self, source: &Source) -> Result<i64, DbError> {
        let job_id = source.job_id.map(|v| v as i32);
        with_conn!(self.pool, conn => {
            diesel::insert_into(sources::table)
                .values((sources::name.eq(&source.name), sources::job_id.eq(job_id), sources::description.eq(&source.description)))
                .execute(&mut conn)
                .await?;
            sources::table.filter(sources::name.eq(&source.name)).select(sources::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }

    pub async fn find_destination_by_name(&self, name: &str) -> Result<Option<Destination>, DbError> {
        with_conn!(self.pool, conn => {
            destinations::table
                .filter(destinations::name.eq(name))
                .first::<DestinationRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Destination::from))
        })
    }

    pub async fn list_destinations(&self) -> Result<Vec<Destination>, DbError> {
        with_conn!(self.pool, conn => {
            destinations::table.load::<DestinationRow>(&mut conn).await.map(|rows| rows.into_iter().map(Destination::from).collect())
        })
    }

    pub async fn insert_destination(&self, destination: &Destination) -> Result<i64, DbError> {
        with_conn!(self.pool, conn => {
            diesel::insert_into(destinations::table)
                .values((
                    destinations::name.eq(&destination.name),
                    destinations::facility_type.eq(&destination.facility_type),
                    destinations::address.eq(&destination.address),
                    destinations::requires_manifest.eq(super::convert::bool_to_int(destination.requires_manifest)),
                ))
                .execute(&mut conn)
                .await?;
            destinations::table.filter(destinations::name.eq(&destination.name)).select(destinations::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }

    pub async fn find_vendor_by_name(&self, name: &str) -> Result<Option<Vendor>, DbError> {
        with_conn!(self.pool, conn => {
            vendors::table
                .filter(vendors::name.eq(name))
                .first::<VendorRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Vendor::from))
        })
    }

    pub async fn list_vendors(&self) -> Result<Vec<Vendor>, DbError> {
        with_conn!(self.pool, conn => {
            vendors::table.load::<VendorRow>(&mut conn).await.map(|rows| rows.into_iter().map(Vendor::from).collect())
        })
    }

    pub async fn insert_vendor(&self, vendor: &Vendor) -> Result<i64, DbError> {
        with_conn!(self.pool, conn => {
            diesel::insert_into(vendors::table)
                .values((vendors::name.eq(&vendor.name), vendors::code.eq(&vendor.code), vendors::contact_info.eq(&vendor.contact_info)))
                .execute(&mut conn)
                .await?;
            vendors::table.filter(vendors::name.eq(&vendor.name)).select(vendors::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }

    pub async fn find_ticket_type_by_name(&self, name: &str) -> Result<Option<TicketType>, DbError> {
        with_conn!(self.pool, conn => {
            ticket_types::table
                .filter(ticket_types::name.eq(name))
                .first::<TicketTypeRow>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(TicketType::from))
        })
    }

    pub async fn list_ticket_types(&self) -> Result<Vec<TicketType>, DbError> {
        with_conn!(self.pool, conn => {
            ticket_types::table.load::<TicketTypeRow>(&mut conn).await.map(|rows| rows.into_iter().map(TicketType::from).collect())
        })
    }

    pub async fn insert_ticket_type(&self, ticket_type: &TicketType) -> Result<i64, DbError> {
        with_conn!(self.pool, conn => {
            diesel::insert_into(ticket_types::table)
                .values(ticket_types::name.eq(ticket_type.name.as_str()))
                .execute(&mut conn)
                .await?;
            ticket_types::table.filter(ticket_types::name.eq(ticket_type.name.as_str())).select(ticket_types::id).first::<i32>(&mut conn).await.map(|id| id as i64)
        })
    }
}
