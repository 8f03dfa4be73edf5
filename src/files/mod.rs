//! File Tracker (C8) — SHA-256 whole-file duplicate detection.
//!
//! Grounded on `storage.rs`'s `DocumentVersion::compute_hash`, generalized
//! to chunked reads so memory stays bounded regardless of input size.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::TruckTicket;

/// Bytes read per chunk while hashing (spec §4.8).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Outcome of a duplicate-file check against previously processed files
/// (spec §4.8).
#[derive(Debug, Clone)]
pub struct FileDuplicateCheck {
    pub is_duplicate: bool,
    pub file_hash: String,
    pub original_file_path: Option<String>,
    pub original_processing_date: Option<chrono::DateTime<chrono::Utc>>,
    pub ticket_count: usize,
    pub ticket_ids: Vec<i64>,
}

/// Compute the SHA-256 hex digest of a file's contents via chunked reads.
pub fn hash_file(path: &Path, chunk_size: usize) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check whether `path` (or a precomputed hash of it) matches a file already
/// processed, given the full set of live tickets that carry that hash.
///
/// `precomputed_hash` lets a caller reuse a hash it already has (e.g. from a
/// prior pass) instead of re-reading the file.
pub fn check_duplicate_file(
    path: &Path,
    precomputed_hash: Option<&str>,
    matching_tickets: &[TruckTicket],
) -> std::io::Result<FileDuplicateCheck> {
    let file_hash = match precomputed_hash {
        Some(hash) => hash.to_string(),
        None => hash_file(path, DEFAULT_CHUNK_SIZE)?,
    };

    if matching_tickets.is_empty() {
        return Ok(FileDuplicateCheck {
            is_duplicate: false,
            file_hash,
            original_file_path: None,
            original_processing_date: None,
            ticket_count: 0,
            ticket_ids: Vec::new(),
        });
    }

    let earliest = matching_tickets.iter().min_by_key(|t| t.created_at).expect("non-empty slice");
    Ok(FileDuplicateCheck {
        is_duplicate: true,
        file_hash,
        original_file_path: Some(earliest.file_id.clone()),
        original_processing_date: Some(earliest.created_at),
        ticket_count: matching_tickets.len(),
        ticket_ids: matching_tickets.iter().map(|t| t.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::io::Write;

    fn sample_ticket(id: i64, file_id: &str) -> TruckTicket {
        TruckTicket {
            id,
            ticket_number: "WM-1".into(),
            ticket_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            job_id: 1,
            material_id: 1,
            ticket_type_id: 1,
            source_id: None,
            destination_id: None,
            vendor_id: None,
            quantity: BigDecimal::from(1),
            quantity_unit: crate::models::QuantityUnit::Loads,
            truck_number: None,
            manifest_number: None,
            file_id: file_id.to_string(),
            file_page: 1,
            file_hash: "abc".into(),
            request_guid: "req".into(),
            confidence_score: 1.0,
            processed_by: "tester".into(),
            review_required: false,
            review_reason: None,
            duplicate_of: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn hash_file_matches_known_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::File::create(&path).unwrap().write_all(b"hello world").unwrap();
        let hash = hash_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(hash, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn hash_file_is_stable_across_chunk_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        std::fs::File::create(&path).unwrap().write_all(&vec![7u8; 20_000]).unwrap();
        let whole = hash_file(&path, 1 << 20).unwrap();
        let chunked = hash_file(&path, 4096).unwrap();
        assert_eq!(whole, chunked);
    }

    #[test]
    fn no_matching_tickets_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"content").unwrap();
        let result = check_duplicate_file(&path, None, &[]).unwrap();
        assert!(!result.is_duplicate);
        assert_eq!(result.ticket_count, 0);
    }

    #[test]
    fn matching_tickets_report_original_file_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"content").unwrap();
        let tickets = vec![sample_ticket(1, "original.pdf"), sample_ticket(2, "original.pdf")];
        let result = check_duplicate_file(&path, None, &tickets).unwrap();
        assert!(result.is_duplicate);
        assert_eq!(result.original_file_path.as_deref(), Some("original.pdf"));
        assert_eq!(result.ticket_count, 2);
        assert_eq!(result.ticket_ids, vec![1, 2]);
    }

    #[test]
    fn precomputed_hash_is_used_without_reading_file() {
        let result =
            check_duplicate_file(Path::new("/nonexistent/path.pdf"), Some("deadbeef"), &[]).unwrap();
        assert_eq!(result.file_hash, "deadbeef");
    }
}
