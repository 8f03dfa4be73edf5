//! Crate-wide error taxonomy.
//!
//! Every module boundary that can fail returns a `thiserror::Error` enum.
//! `TicketError` is the taxonomy from the processing-run/review-queue design:
//! each variant carries exactly the detail a caller needs to either retry,
//! write a review-queue entry, or bubble up to the batch orchestrator.

use thiserror::Error;

use crate::duplicate::DuplicateMatch;
use crate::validate::ManifestValidation;

/// Errors raised while resolving, validating, or persisting a ticket.
///
/// Variant names match the `reason` taxonomy in spec §7 so that
/// `ReviewQueueEntry::reason` and `TicketError` stay in lockstep.
#[derive(Debug, Error)]
pub enum TicketError {
    /// A required foreign key (job, material, ticket type) did not resolve
    /// to a live reference row.
    #[error("foreign key did not resolve: {field} = {value:?}")]
    ForeignKey { field: &'static str, value: String },

    /// Manifest validation failed (missing or malformed).
    #[error("manifest validation failed: {0:?}")]
    Validation(ManifestValidation),

    /// The ticket matches an already-accepted ticket within the duplicate
    /// window.
    #[error("duplicate of ticket {}", .0.original_ticket_id)]
    Duplicate(DuplicateMatch),

    /// The source file is a byte-for-byte duplicate of an already-processed
    /// file.
    #[error("duplicate file, original processed at {original_path}")]
    DuplicateFile { original_path: String },

    /// OCR produced no usable ticket number.
    #[error("missing ticket number")]
    MissingTicketNumber,

    /// OCR produced a date that did not parse, or parsed outside the
    /// acceptable window.
    #[error("invalid or unparseable date: {0:?}")]
    InvalidDate(Option<String>),

    /// Page failed a fast OCRability pre-check before OCR was invoked.
    #[error("low quality scan: {0}")]
    LowQualityScan(String),

    /// Unexpected fault anywhere in the pipeline. Never written to the
    /// review queue; recorded as a batch-level error count instead.
    #[error("processing error: {0}")]
    Processing(String),

    /// Per-file processing exceeded its configured timeout.
    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Repository/database failure not covered by a more specific variant.
    #[error("repository error: {0}")]
    Repository(#[from] diesel::result::Error),
}

impl TicketError {
    /// The `reason` string recorded on a `ReviewQueueEntry`, if this error
    /// produces one. `Processing` and `Timeout` never produce a review entry
    /// per spec §7 — they are counted in the processing-run ledger instead.
    pub fn review_reason(&self) -> Option<&'static str> {
        match self {
            TicketError::ForeignKey { .. } => Some("FOREIGN_KEY_ERROR"),
            TicketError::Validation(v) if !v.is_valid => Some(v.reason()),
            TicketError::Validation(_) => None,
            TicketError::Duplicate(_) => Some("DUPLICATE_TICKET"),
            TicketError::DuplicateFile { .. } => Some("DUPLICATE_FILE"),
            TicketError::MissingTicketNumber => Some("MISSING_TICKET_NUMBER"),
            TicketError::InvalidDate(_) => Some("INVALID_DATE"),
            TicketError::LowQualityScan(_) => Some("LOW_QUALITY_SCAN"),
            TicketError::Processing(_) | TicketError::Timeout(_) | TicketError::Repository(_) => {
                None
            }
        }
    }

    /// Severity to use for the corresponding review-queue entry.
    pub fn severity(&self) -> crate::models::review::Severity {
        use crate::models::review::Severity;
        match self {
            TicketError::ForeignKey { .. }
            | TicketError::MissingTicketNumber
            | TicketError::InvalidDate(_) => Severity::Critical,
            TicketError::Validation(v) => v.severity,
            TicketError::Duplicate(_) => Severity::Warning,
            TicketError::DuplicateFile { .. } => Severity::Info,
            TicketError::LowQualityScan(_) => Severity::Warning,
            TicketError::Processing(_) | TicketError::Timeout(_) | TicketError::Repository(_) => {
                Severity::Critical
            }
        }
    }
}
