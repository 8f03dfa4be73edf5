//! Exporters (C13) — read-only query contracts over the persisted dataset.
//!
//! Concrete CSV/XLSX byte-level writers are out of scope (spec §1 Non-goals,
//! expanded); this module owns the part the teacher's `repository/*`
//! `queries.rs`-style read helpers would own in that repo — resolving the
//! denormalized view a writer needs and the pure sorting/grouping logic a
//! writer would otherwise have to duplicate per format.

pub mod job_calendar;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{MaterialClass, ReviewQueueEntry, TicketTypeName, TruckTicket};
use crate::repository::{DbError, ReferenceRepository};

/// One ticket, denormalized with its reference names and job-calendar
/// labels, ready for any concrete export writer to format.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub ticket_id: i64,
    pub ticket_number: String,
    pub ticket_date: NaiveDate,
    pub job_name: String,
    pub material_name: String,
    pub material_class: MaterialClass,
    pub ticket_type: TicketTypeName,
    pub source_name: Option<String>,
    pub destination_name: Option<String>,
    pub vendor_name: Option<String>,
    pub quantity: bigdecimal::BigDecimal,
    pub quantity_unit: crate::models::QuantityUnit,
    pub truck_number: Option<String>,
    pub manifest_number: Option<String>,
    pub job_week: i64,
    pub job_month: String,
}

/// Load every reference table once and resolve `tickets` against it. This
/// mirrors the cache's name-resolution role (C1) but in the opposite
/// direction: id -> name, for read-only reporting rather than write-path FK
/// resolution.
pub async fn build_export_rows(
    tickets: &[TruckTicket],
    reference: &ReferenceRepository,
) -> Result<Vec<ExportRow>, DbError> {
    let jobs: HashMap<i64, crate::models::Job> =
        reference.list_jobs().await?.into_iter().map(|j| (j.id, j)).collect();
    let materials: HashMap<i64, crate::models::Material> =
        reference.list_materials().await?.into_iter().map(|m| (m.id, m)).collect();
    let sources: HashMap<i64, crate::models::Source> =
        reference.list_sources().await?.into_iter().map(|s| (s.id, s)).collect();
    let destinations: HashMap<i64, crate::models::Destination> =
        reference.list_destinations().await?.into_iter().map(|d| (d.id, d)).collect();
    let vendors: HashMap<i64, crate::models::Vendor> =
        reference.list_vendors().await?.into_iter().map(|v| (v.id, v)).collect();
    let ticket_types: HashMap<i64, crate::models::TicketType> =
        reference.list_ticket_types().await?.into_iter().map(|t| (t.id, t)).collect();

    let rows = tickets
        .iter()
        .filter_map(|ticket| {
            let job = jobs.get(&ticket.job_id)?;
            let material = materials.get(&ticket.material_id)?;
            let ticket_type = ticket_types.get(&ticket.ticket_type_id)?;
            Some(ExportRow {
                ticket_id: ticket.id,
                ticket_number: ticket.ticket_number.clone(),
                ticket_date: ticket.ticket_date,
                job_name: job.name.clone(),
                material_name: material.name.clone(),
                material_class: material.class,
                ticket_type: ticket_type.name,
                source_name: ticket.source_id.and_then(|id| sources.get(&id)).map(|s| s.name.clone()),
                destination_name: ticket.destination_id.and_then(|id| destinations.get(&id)).map(|d| d.name.clone()),
                vendor_name: ticket.vendor_id.and_then(|id| vendors.get(&id)).map(|v| v.name.clone()),
                quantity: ticket.quantity.clone(),
                quantity_unit: ticket.quantity_unit,
                truck_number: ticket.truck_number.clone(),
                manifest_number: ticket.manifest_number.clone(),
                job_week: job_calendar::job_week(ticket.ticket_date, job.start_date),
                job_month: job_calendar::job_month(ticket.ticket_date, job.start_date),
            })
        })
        .collect();
    Ok(rows)
}

/// The five sheets of the tracking workbook (spec §4.13), each sorted the
/// way a reviewer would expect to read it: chronologically within a group.
#[derive(Debug, Clone, Default)]
pub struct TrackingWorkbook {
    pub daily_combined: Vec<ExportRow>,
    pub contaminated_by_source: Vec<ExportRow>,
    pub clean_by_source: Vec<ExportRow>,
    pub spoils_by_source: Vec<ExportRow>,
    pub imports_by_material: Vec<ExportRow>,
}

fn sorted_by_date(mut rows: Vec<ExportRow>) -> Vec<ExportRow> {
    rows.sort_by(|a, b| a.ticket_date.cmp(&b.ticket_date).then_with(|| a.ticket_number.cmp(&b.ticket_number)));
    rows
}

fn sorted_by_source_then_date(mut rows: Vec<ExportRow>) -> Vec<ExportRow> {
    rows.sort_by(|a, b| {
        a.source_name.cmp(&b.source_name).then_with(|| a.ticket_date.cmp(&b.ticket_date)).then_with(|| a.ticket_number.cmp(&b.ticket_number))
    });
    rows
}

fn sorted_by_material_then_date(mut rows: Vec<ExportRow>) -> Vec<ExportRow> {
    rows.sort_by(|a, b| {
        a.material_name.cmp(&b.material_name).then_with(|| a.ticket_date.cmp(&b.ticket_date)).then_with(|| a.ticket_number.cmp(&b.ticket_number))
    });
    rows
}

/// Shape `rows` (already resolved by [`build_export_rows`]) into the five
/// tracking-workbook sheets.
pub fn tracking_workbook(rows: Vec<ExportRow>) -> TrackingWorkbook {
    let daily_combined = sorted_by_date(rows.clone());
    let contaminated_by_source =
        sorted_by_source_then_date(rows.iter().filter(|r| r.material_class == MaterialClass::Contaminated).cloned().collect());
    let clean_by_source =
        sorted_by_source_then_date(rows.iter().filter(|r| r.material_class == MaterialClass::Clean).cloned().collect());
    let spoils_by_source =
        sorted_by_source_then_date(rows.iter().filter(|r| r.material_class == MaterialClass::Spoils).cloned().collect());
    let imports_by_material =
        sorted_by_material_then_date(rows.into_iter().filter(|r| r.ticket_type == TicketTypeName::Import).collect());
    TrackingWorkbook { daily_combined, contaminated_by_source, clean_by_source, spoils_by_source, imports_by_material }
}

/// Invoice CSV row order (spec §4.13): sorted by vendor, then date, then
/// ticket number. A concrete writer pipe-delimits these fields; this
/// function only owns the ordering.
pub fn invoice_rows(mut rows: Vec<ExportRow>) -> Vec<ExportRow> {
    rows.sort_by(|a, b| {
        a.vendor_name.cmp(&b.vendor_name).then_with(|| a.ticket_date.cmp(&b.ticket_date)).then_with(|| a.ticket_number.cmp(&b.ticket_number))
    });
    rows
}

/// One row of the manifest log, flagging whether its manifest number has
/// been seen on an earlier row in the same chronological pass (spec
/// §4.13's "duplicate-manifest detection").
#[derive(Debug, Clone)]
pub struct ManifestLogRow {
    pub row: ExportRow,
    pub is_duplicate_manifest: bool,
}

/// Contaminated-material rows only, chronological, each flagged for
/// manifest-number reuse (spec §4.13).
pub fn manifest_log(rows: Vec<ExportRow>) -> Vec<ManifestLogRow> {
    let contaminated = sorted_by_date(rows.into_iter().filter(|r| r.material_class == MaterialClass::Contaminated).collect());
    let mut seen = std::collections::HashSet::new();
    contaminated
        .into_iter()
        .map(|row| {
            let is_duplicate_manifest = match &row.manifest_number {
                Some(manifest) => !seen.insert(manifest.clone()),
                None => false,
            };
            ManifestLogRow { row, is_duplicate_manifest }
        })
        .collect()
}

/// Review-queue export ordering: severity first (`CRITICAL` before
/// `WARNING` before `INFO`), then creation order within a severity (spec
/// §4.13).
pub fn review_queue_export(mut entries: Vec<ReviewQueueEntry>) -> Vec<ReviewQueueEntry> {
    entries.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.created_at.cmp(&b.created_at)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn row(
        ticket_number: &str,
        date: NaiveDate,
        material_class: MaterialClass,
        ticket_type: TicketTypeName,
        vendor: &str,
        source: &str,
        manifest_number: Option<&str>,
    ) -> ExportRow {
        ExportRow {
            ticket_id: 1,
            ticket_number: ticket_number.to_string(),
            ticket_date: date,
            job_name: "24-105".to_string(),
            material_name: "CLASS_2_CONTAMINATED".to_string(),
            material_class,
            ticket_type,
            source_name: Some(source.to_string()),
            destination_name: None,
            vendor_name: Some(vendor.to_string()),
            quantity: BigDecimal::from(1),
            quantity_unit: crate::models::QuantityUnit::Loads,
            truck_number: None,
            manifest_number: manifest_number.map(|m| m.to_string()),
            job_week: 1,
            job_month: "001".to_string(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn tracking_workbook_splits_by_material_class_and_ticket_type() {
        let rows = vec![
            row("T1", d(2026, 1, 2), MaterialClass::Contaminated, TicketTypeName::Export, "WM", "SPG", Some("MANIFEST01")),
            row("T2", d(2026, 1, 1), MaterialClass::Clean, TicketTypeName::Export, "WM", "SPG", None),
            row("T3", d(2026, 1, 3), MaterialClass::Spoils, TicketTypeName::Export, "WM", "SPG", None),
            row("T4", d(2026, 1, 1), MaterialClass::Import, TicketTypeName::Import, "WM", "SPG", None),
        ];
        let workbook = tracking_workbook(rows);
        assert_eq!(workbook.daily_combined.len(), 4);
        assert_eq!(workbook.daily_combined[0].ticket_number, "T2"); // earliest date first
        assert_eq!(workbook.contaminated_by_source.len(), 1);
        assert_eq!(workbook.clean_by_source.len(), 1);
        assert_eq!(workbook.spoils_by_source.len(), 1);
        assert_eq!(workbook.imports_by_material.len(), 1);
    }

    #[test]
    fn invoice_rows_sort_by_vendor_then_date_then_ticket() {
        let rows = vec![
            row("T2", d(2026, 1, 1), MaterialClass::Contaminated, TicketTypeName::Export, "Z_VENDOR", "SPG", None),
            row("T1", d(2026, 1, 1), MaterialClass::Contaminated, TicketTypeName::Export, "A_VENDOR", "SPG", None),
        ];
        let sorted = invoice_rows(rows);
        assert_eq!(sorted[0].vendor_name.as_deref(), Some("A_VENDOR"));
    }

    #[test]
    fn manifest_log_flags_second_occurrence_of_a_manifest_number() {
        let rows = vec![
            row("T1", d(2026, 1, 1), MaterialClass::Contaminated, TicketTypeName::Export, "WM", "SPG", Some("MANIFEST01")),
            row("T2", d(2026, 1, 2), MaterialClass::Contaminated, TicketTypeName::Export, "WM", "SPG", Some("MANIFEST01")),
        ];
        let log = manifest_log(rows);
        assert!(!log[0].is_duplicate_manifest);
        assert!(log[1].is_duplicate_manifest);
    }

    #[test]
    fn manifest_log_excludes_non_contaminated_rows() {
        let rows = vec![row("T1", d(2026, 1, 1), MaterialClass::Clean, TicketTypeName::Export, "WM", "SPG", Some("M1"))];
        assert!(manifest_log(rows).is_empty());
    }
}
