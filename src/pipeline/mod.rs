//! Page Pipeline (C9) — per-page orchestration: OCR → vendor → fields →
//! normalize → validate → persist OR review (spec §4.9).
//!
//! Grounded on `ocr/extractor.rs`'s top-level `extract_ticket_fields`
//! sequencing, generalized from a single monolithic function into the
//! discrete C1-C8 components this crate already has, composed here in the
//! order spec §4.9 prescribes.

pub mod preflight;

use chrono::NaiveDate;
use serde_json::json;

use crate::cache::ReferenceCache;
use crate::error::TicketError;
use crate::extract::{self, guarded};
use crate::imaging::PageBitmap;
use crate::models::reference::TicketTypeName;
use crate::models::{NewReviewEntry, NewTicket, PageId, Severity};
use crate::normalize::{Category, SynonymNormalizer};
use crate::ocr::{OcrAdapter, OcrResult, OrientationHint};
use crate::repository::{DbError, ReferenceRepository, ReviewQueueRepository, TicketRepository};
use crate::vendor::{self, VendorTemplate};

use self::preflight::PreflightConfig;

/// Fail-safe material default applied when no material can be determined at
/// all: forces manifest review rather than silently admitting an
/// unclassified load (spec §4.9 step 6, §9 Open Question #1).
pub const DEFAULT_MATERIAL_NAME: &str = "CLASS_2_CONTAMINATED";

/// Filename-derived hints parsed from the `JOB__YYYY-MM-DD__SOURCE__TYPE
/// [__MATERIAL[__VENDOR]][__NNN]` convention (spec §6 "Input file
/// conventions"). Any component absent from the filename is `None`; this is
/// not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameHints {
    pub job_code: Option<String>,
    pub ticket_date: Option<NaiveDate>,
    pub source_name: Option<String>,
    pub ticket_type: Option<String>,
    pub material_name: Option<String>,
    pub vendor_name: Option<String>,
}

/// Parse `path`'s file stem according to the filename convention. A trailing
/// component consisting only of digits is a legacy page-count suffix and is
/// dropped before assigning the remaining components.
pub fn parse_filename_hints(path: &std::path::Path) -> FilenameHints {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return FilenameHints::default();
    };

    let mut parts: Vec<&str> = stem.split("__").collect();
    if parts.len() < 4 {
        return FilenameHints::default();
    }

    if parts.len() > 4 {
        if let Some(last) = parts.last() {
            if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
                parts.pop();
            }
        }
    }

    FilenameHints {
        job_code: Some(parts[0].to_string()),
        ticket_date: NaiveDate::parse_from_str(parts[1], "%Y-%m-%d").ok(),
        source_name: Some(parts[2].to_string()),
        ticket_type: Some(parts[3].to_string()),
        material_name: parts.get(4).map(|s| s.to_string()),
        vendor_name: parts.get(5).map(|s| s.to_string()),
    }
}

/// Everything the pipeline needs about one input page beyond the filename
/// hints: identity, the already-computed file hash, and an optional decoded
/// bitmap (absent when no [`crate::imaging::ImageProducer`] is configured).
#[derive(Debug, Clone)]
pub struct PageInput {
    pub file_id: String,
    pub file_path: String,
    pub file_page: u32,
    pub file_hash: String,
    pub image: Option<PageBitmap>,
    pub filename_hints: FilenameHints,
}

/// Fixed-per-run settings the page pipeline needs but does not itself own
/// (spec §6 configuration surface, narrowed to what C9 consumes directly).
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub job_code: String,
    pub default_ticket_type: TicketTypeName,
    pub processed_by: String,
    pub request_guid: String,
    pub today: NaiveDate,
    pub validate_manifest: bool,
    pub check_duplicates: bool,
    pub duplicate_window_days: i64,
    pub preflight: PreflightConfig,
}

/// The per-page outcome returned to the batch orchestrator (spec §4.9 step
/// 8's `PageResult`). Always populated — the pipeline never propagates a
/// domain failure as an exception, only infrastructure failures (a
/// genuinely unreachable database) surface as `Err`.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub success: bool,
    pub ticket_id: Option<i64>,
    pub review_queue_id: Option<i64>,
    pub error: Option<String>,
    pub extracted_data: serde_json::Value,
    pub confidences: serde_json::Value,
}

/// Fold an extra detail object into `extracted_data` for a review entry,
/// without discarding the fields already extracted.
fn merge_extra(mut extracted_data: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    if let (Some(base), serde_json::Value::Object(extra)) = (extracted_data.as_object_mut(), extra) {
        base.extend(extra);
    }
    extracted_data
}

impl PageResult {
    fn ticket(ticket_id: i64, extracted_data: serde_json::Value, confidences: serde_json::Value) -> Self {
        Self { success: true, ticket_id: Some(ticket_id), review_queue_id: None, error: None, extracted_data, confidences }
    }

    fn review(review_queue_id: i64, reason: &str, extracted_data: serde_json::Value, confidences: serde_json::Value) -> Self {
        Self {
            success: false,
            ticket_id: None,
            review_queue_id: Some(review_queue_id),
            error: Some(reason.to_string()),
            extracted_data,
            confidences,
        }
    }

    fn processing_error(message: String) -> Self {
        Self {
            success: false,
            ticket_id: None,
            review_queue_id: None,
            error: Some(message),
            extracted_data: serde_json::Value::Null,
            confidences: serde_json::Value::Null,
        }
    }
}

/// The collaborators C9 composes: OCR (external), vendor templates (C4
/// input), the synonym normalizer (C2), and the repositories (C1 via the
/// caller's cache, C7, C12).
pub struct PagePipeline<'a> {
    pub ocr: &'a dyn OcrAdapter,
    pub vendor_templates: &'a [VendorTemplate],
    pub normalizer: &'a SynonymNormalizer,
    pub tickets: &'a TicketRepository,
    pub review_queue: &'a ReviewQueueRepository,
    pub reference: &'a ReferenceRepository,
}

impl<'a> PagePipeline<'a> {
    async fn write_review(
        &self,
        input: &PageInput,
        reason: &str,
        severity: Severity,
        extracted_data: serde_json::Value,
        confidences: serde_json::Value,
    ) -> Result<PageResult, DbError> {
        let entry = NewReviewEntry {
            ticket_id: None,
            page_id: PageId { file_id: input.file_id.clone(), file_page: input.file_page },
            reason: reason.to_string(),
            severity,
            file_path: input.file_path.clone(),
            page_num: input.file_page,
            detected_fields: extracted_data.clone(),
            suggested_fixes: serde_json::Value::Null,
        };
        let id = self.review_queue.insert(&entry).await?;
        Ok(PageResult::review(id, reason, extracted_data, confidences))
    }

    /// Run the full per-page sequence described in spec §4.9.
    pub async fn process_page(
        &self,
        cache: &mut ReferenceCache,
        ctx: &PipelineContext,
        input: PageInput,
    ) -> Result<PageResult, DbError> {
        // Step 1 (filename hints) already happened: `input.filename_hints`.

        // Preflight, image-only pass, ahead of the OCR call.
        if let Some(image) = &input.image {
            if let Some(reason) = preflight::check_image(image, &ctx.preflight) {
                return self
                    .write_review(
                        &input,
                        "LOW_QUALITY_SCAN",
                        Severity::Warning,
                        json!({ "preflight_reason": reason }),
                        serde_json::Value::Null,
                    )
                    .await;
            }
        }

        // Step 2: OCR.
        let ocr_result = match &input.image {
            Some(image) => match self.ocr.recognize(image) {
                Ok(result) => result,
                Err(err) => {
                    return Ok(PageResult::processing_error(format!("OCR call failed: {err}")));
                }
            },
            None => OcrResult { text: String::new(), confidence: 0.0, orientation: OrientationHint::upright() },
        };

        if let Some(reason) = preflight::check_text(&ocr_result.text, &ctx.preflight) {
            return self
                .write_review(
                    &input,
                    "LOW_QUALITY_SCAN",
                    Severity::Warning,
                    json!({ "preflight_reason": reason }),
                    serde_json::Value::Null,
                )
                .await;
        }

        // Step 3: vendor detection.
        let (vendor_name, vendor_confidence) = vendor::detect_vendor(
            &ocr_result.text,
            input.filename_hints.vendor_name.as_deref(),
            input.image.as_ref(),
            self.vendor_templates,
            self.normalizer,
        );

        // Step 4: field extraction.
        let (ticket_number, ticket_number_confidence) =
            guarded((None, 0.0), || extract::extract_ticket_number(&ocr_result.text, None));
        let (manifest_number, manifest_confidence, _manifest_well_formed) =
            guarded((None, 0.0, false), || extract::extract_manifest_number(&ocr_result.text));
        let (ticket_date, date_confidence) = guarded((None, 0.0), || {
            extract::extract_date(
                &ocr_result.text,
                input.filename_hints.ticket_date.map(|d| d.format("%Y-%m-%d").to_string()).as_deref(),
                None,
                ctx.today,
            )
        });
        let (quantity, quantity_unit, quantity_confidence) =
            guarded((Default::default(), crate::models::QuantityUnit::Loads, 0.0), || {
                extract::extract_quantity(&ocr_result.text, None)
            });
        let (truck_number, truck_confidence) = guarded((None, 0.0), || extract::extract_truck_number(&ocr_result.text));

        let mean_confidence = (ticket_number_confidence + date_confidence + quantity_confidence) / 3.0;

        let extracted_data = json!({
            "ticket_number": ticket_number,
            "ticket_date": ticket_date.map(|d| d.to_string()),
            "quantity": quantity.to_string(),
            "quantity_unit": quantity_unit.as_str(),
            "truck_number": truck_number,
            "manifest_number": manifest_number,
            "vendor": vendor_name,
            "source": input.filename_hints.source_name,
        });
        let confidences = json!({
            "ticket_number": ticket_number_confidence,
            "date": date_confidence,
            "quantity": quantity_confidence,
            "truck_number": truck_confidence,
            "manifest_number": manifest_confidence,
            "vendor": vendor_confidence,
            "mean": mean_confidence,
        });

        // Step 5: critical completeness gate.
        let Some(ticket_number) = ticket_number else {
            return self
                .write_review(&input, "MISSING_TICKET_NUMBER", Severity::Critical, extracted_data, confidences)
                .await;
        };
        let Some(ticket_date) = ticket_date else {
            return self.write_review(&input, "INVALID_DATE", Severity::Critical, extracted_data, confidences).await;
        };

        // Step 6: normalization.
        let material_name = match &input.filename_hints.material_name {
            Some(raw) => self.normalizer.normalize(Category::Materials, raw),
            None => {
                tracing::warn!(
                    file_id = %input.file_id,
                    file_page = input.file_page,
                    "material undetermined, defaulting to {}",
                    DEFAULT_MATERIAL_NAME
                );
                DEFAULT_MATERIAL_NAME.to_string()
            }
        };
        let source_name = input.filename_hints.source_name.as_ref().map(|raw| self.normalizer.normalize(Category::Sources, raw));
        // Destination facilities in this deployment's reference data share a
        // name with the vendor that operates them (see `repository::seed`),
        // so a resolved vendor doubles as the destination hint.
        let destination_name = vendor_name.clone();

        let ticket_type = input
            .filename_hints
            .ticket_type
            .as_deref()
            .and_then(TicketTypeName::parse)
            .unwrap_or(ctx.default_ticket_type);

        let new_ticket = NewTicket {
            ticket_number,
            ticket_date,
            job_name: ctx.job_code.clone(),
            material_name,
            ticket_type,
            source_name,
            destination_name,
            vendor_name,
            quantity,
            quantity_unit,
            truck_number,
            manifest_number,
            file_id: input.file_id.clone(),
            file_page: input.file_page,
            file_hash: input.file_hash.clone(),
            request_guid: ctx.request_guid.clone(),
            confidence_score: mean_confidence,
            processed_by: ctx.processed_by.clone(),
        };

        let options = crate::repository::CreateOptions {
            validate_manifest: ctx.validate_manifest,
            check_duplicates: ctx.check_duplicates,
            duplicate_window_days: ctx.duplicate_window_days,
        };

        // Step 7: persistence, with error -> review-entry mapping (spec §7).
        // `TicketRepository::create` only ever raises `ForeignKey`,
        // `Validation`, `Duplicate`, or `Repository`; the other
        // `TicketError` variants are produced earlier in this method and
        // handled inline above, not here.
        match self.tickets.create(new_ticket, options, cache, self.reference).await {
            Ok(ticket) => Ok(PageResult::ticket(ticket.id, extracted_data, confidences)),
            Err(TicketError::Repository(db_err)) => Err(db_err),
            Err(other) => {
                let extra = match &other {
                    TicketError::ForeignKey { field, value } => json!({ "field": field, "value": value }),
                    TicketError::Duplicate(matched) => {
                        json!({ "original_ticket_id": matched.original_ticket_id, "days_apart": matched.days_apart })
                    }
                    _ => serde_json::Value::Null,
                };
                let reason = other.review_reason().unwrap_or("PROCESSING_ERROR");
                self.write_review(&input, reason, other.severity(), merge_extra(extracted_data, extra), confidences)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parses_full_filename_convention() {
        let hints = parse_filename_hints(Path::new(
            "24-105__2025-10-17__SPG__EXPORT__CLASS_2_CONTAMINATED__WASTE_MANAGEMENT_LEWISVILLE.pdf",
        ));
        assert_eq!(hints.job_code.as_deref(), Some("24-105"));
        assert_eq!(hints.ticket_date, NaiveDate::from_ymd_opt(2025, 10, 17));
        assert_eq!(hints.source_name.as_deref(), Some("SPG"));
        assert_eq!(hints.ticket_type.as_deref(), Some("EXPORT"));
        assert_eq!(hints.material_name.as_deref(), Some("CLASS_2_CONTAMINATED"));
        assert_eq!(hints.vendor_name.as_deref(), Some("WASTE_MANAGEMENT_LEWISVILLE"));
    }

    #[test]
    fn strips_trailing_load_count_suffix() {
        let hints = parse_filename_hints(Path::new("24-105__2025-10-17__SPG__EXPORT__001.pdf"));
        assert_eq!(hints.material_name, None);
        assert_eq!(hints.vendor_name, None);
    }

    #[test]
    fn minimal_filename_has_only_mandatory_components() {
        let hints = parse_filename_hints(Path::new("24-105__2025-10-17__SPG__EXPORT.pdf"));
        assert_eq!(hints.job_code.as_deref(), Some("24-105"));
        assert!(hints.material_name.is_none());
        assert!(hints.vendor_name.is_none());
    }

    #[test]
    fn unconventional_filename_yields_all_none() {
        let hints = parse_filename_hints(Path::new("scan0001.pdf"));
        assert_eq!(hints, FilenameHints::default());
    }
}
