//! Batch Orchestrator (C10) — worker-pool driver across files with retry,
//! progress reporting, and rollback policy (spec §4.10, §5).
//!
//! Grounded on `services/download/mod.rs`'s bounded-worker-pool +
//! `mpsc`-progress-channel shape: each worker here processes one file at a
//! time, serially across its pages, and reports through the same kind of
//! event channel rather than a shared mutable counter guarded by a lock.

mod types;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use walkdir::WalkDir;

use crate::cache::ReferenceCache;
use crate::files;
use crate::models::{NewReviewEntry, PageId, RunStatus, Severity};
use crate::normalize::SynonymNormalizer;
use crate::ocr::OcrAdapter;
use crate::pipeline::{parse_filename_hints, PageInput, PagePipeline, PipelineContext};
use crate::repository::{DbPool, ProcessingRunRepository, ReferenceRepository, ReviewQueueRepository, TicketRepository};
use crate::vendor::VendorTemplate;

pub use types::{BatchConfig, BatchEvent, BatchResult};

/// DPI passed to the image producer when rasterizing a page (spec §6
/// `preflight.dpi_threshold` names the minimum acceptable; this is the
/// resolution requested up front).
const DEFAULT_RASTER_DPI: u32 = 300;

/// Everything needed to process one file's pages end to end, shared
/// read-only across workers (spec §5 "Shared state" — the reference cache
/// is explicitly per-worker, never shared without synchronization, so it is
/// constructed fresh inside each worker task rather than passed in here).
pub struct BatchDeps {
    pub pool: DbPool,
    pub ocr: Arc<dyn OcrAdapter>,
    pub vendor_templates: Arc<Vec<VendorTemplate>>,
    pub normalizer: Arc<SynonymNormalizer>,
    pub image_producer: Option<Arc<dyn crate::imaging::ImageProducer>>,
    pub processed_by: String,
    pub job_code: String,
    pub default_ticket_type: crate::models::TicketTypeName,
}

/// Discover input files under `input_dir` non-recursively filtered by
/// `glob_pattern`'s extension (the glob crate is not part of the teacher's
/// stack; `walkdir` plus an extension check covers the one pattern this
/// component actually needs, a fixed suffix).
fn discover_files(input_dir: &Path, glob_pattern: &str) -> Vec<PathBuf> {
    let suffix = glob_pattern.trim_start_matches('*');
    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.to_string_lossy().ends_with(suffix))
        .collect();
    files.sort();
    files
}

/// Process every page of a single file through [`PagePipeline`], returning
/// the counters produced and whether any page-level failure occurred. A
/// `Result::Err` here is an infrastructure failure (unreachable database),
/// the only kind that should trigger the retry loop in [`run_batch`].
async fn process_file(
    deps: &BatchDeps,
    path: &Path,
    request_guid: &str,
    check_duplicate_files: bool,
) -> Result<types::FileOutcome, crate::repository::DbError> {
    let tickets = TicketRepository::new(deps.pool.clone());
    let review_queue = ReviewQueueRepository::new(deps.pool.clone());
    let reference = ReferenceRepository::new(deps.pool.clone());
    let mut cache = ReferenceCache::new();

    let pipeline = PagePipeline {
        ocr: deps.ocr.as_ref(),
        vendor_templates: deps.vendor_templates.as_ref(),
        normalizer: deps.normalizer.as_ref(),
        tickets: &tickets,
        review_queue: &review_queue,
        reference: &reference,
    };

    let filename_hints = parse_filename_hints(path);
    let file_hash = files::hash_file(path, files::DEFAULT_CHUNK_SIZE)
        .map_err(|err| diesel::result::Error::QueryBuilderError(Box::new(err)))?;

    let file_id = path.to_string_lossy().to_string();

    // C8 whole-file short-circuit (spec §4.8, §7 `DUPLICATE_FILE`): a file
    // whose bytes match one already carried by a live ticket is skipped
    // entirely, with a single advisory review entry, before any OCR runs.
    if check_duplicate_files {
        let matching_tickets = tickets.get_by_file_hash(&file_hash).await?;
        let check = files::check_duplicate_file(path, Some(&file_hash), &matching_tickets)
            .map_err(|err| diesel::result::Error::QueryBuilderError(Box::new(err)))?;
        if check.is_duplicate {
            let entry = NewReviewEntry {
                ticket_id: None,
                page_id: PageId { file_id: file_id.clone(), file_page: 0 },
                reason: "DUPLICATE_FILE".to_string(),
                severity: Severity::Info,
                file_path: file_id.clone(),
                page_num: 0,
                detected_fields: serde_json::json!({
                    "file_hash": check.file_hash,
                    "original_file_path": check.original_file_path,
                    "original_processing_date": check.original_processing_date,
                    "ticket_count": check.ticket_count,
                    "ticket_ids": check.ticket_ids,
                }),
                suggested_fixes: serde_json::Value::Null,
            };
            review_queue.insert(&entry).await?;
            return Ok(types::FileOutcome { pages: 0, tickets_created: 0, review_queue_count: 1, errors: 0 });
        }
    }

    let images = match &deps.image_producer {
        Some(producer) => producer.render_pages(path, DEFAULT_RASTER_DPI).unwrap_or_default(),
        None => Vec::new(),
    };
    let page_count = images.len().max(1);

    let ctx = PipelineContext {
        job_code: deps.job_code.to_string(),
        default_ticket_type: deps.default_ticket_type,
        processed_by: deps.processed_by.to_string(),
        request_guid: request_guid.to_string(),
        today: chrono::Utc::now().date_naive(),
        validate_manifest: true,
        check_duplicates: true,
        duplicate_window_days: crate::duplicate::DEFAULT_WINDOW_DAYS,
        preflight: crate::pipeline::preflight::PreflightConfig::default(),
    };

    let mut outcome = types::FileOutcome::default();
    let mut images = images.into_iter().map(Some).collect::<Vec<_>>();
    images.resize_with(page_count, || None);

    for (index, image) in images.into_iter().enumerate() {
        let input = PageInput {
            file_id: file_id.clone(),
            file_path: file_id.clone(),
            file_page: (index + 1) as u32,
            file_hash: file_hash.clone(),
            image,
            filename_hints: filename_hints.clone(),
        };
        let result = pipeline.process_page(&mut cache, &ctx, input).await?;
        outcome.pages += 1;
        if result.success {
            outcome.tickets_created += 1;
        } else if result.review_queue_id.is_some() {
            outcome.review_queue_count += 1;
        } else {
            outcome.errors += 1;
        }
    }

    Ok(outcome)
}

/// Run the full batch: enumerate files, process each through a bounded
/// worker pool with per-file retry, and frame the run in the processing-run
/// ledger (C11).
pub async fn run_batch(
    deps: BatchDeps,
    input_dir: &Path,
    config: BatchConfig,
    runs: &ProcessingRunRepository,
    progress: Option<mpsc::Sender<BatchEvent>>,
) -> Result<BatchResult, crate::repository::DbError> {
    let request_guid = uuid::Uuid::new_v4().to_string();
    let files = discover_files(input_dir, &config.glob_pattern);

    if files.is_empty() {
        return Ok(BatchResult {
            status: RunStatus::Completed,
            request_guid,
            files_total: 0,
            files_succeeded: 0,
            files_failed: 0,
            counters: Default::default(),
        });
    }

    let config_snapshot = serde_json::json!({
        "max_workers": config.max_workers,
        "chunk_size": config.chunk_size,
        "timeout_per_file_secs": config.timeout_per_file.as_secs(),
        "retry_attempts": config.retry_attempts,
        "continue_on_error": config.continue_on_error,
        "rollback_on_critical": config.rollback_on_critical,
        "glob_pattern": config.glob_pattern,
    });
    let run_id = runs.start_run(&request_guid, &deps.processed_by, &config_snapshot).await?;

    let deps = Arc::new(deps);
    let max_workers = config.max_workers.unwrap_or_else(|| {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    });
    let semaphore = Arc::new(tokio::sync::Semaphore::new(max_workers.max(1)));
    let cancel = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let counters = Arc::new(Mutex::new(crate::models::RunCounters::default()));
    let files_succeeded = Arc::new(AtomicUsize::new(0));
    let files_failed = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(files.len());
    for path in files.iter().cloned() {
        let deps = deps.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        let counters = counters.clone();
        let files_succeeded = files_succeeded.clone();
        let files_failed = files_failed.clone();
        let completed = completed.clone();
        let progress = progress.clone();
        let request_guid = request_guid.clone();
        let retry_attempts = config.retry_attempts;
        let timeout_per_file = config.timeout_per_file;
        let continue_on_error = config.continue_on_error;
        let check_duplicate_files = config.check_duplicate_files;
        let total = files.len();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore not closed");
            if cancel.load(Ordering::Relaxed) {
                return;
            }

            let mut last_error: Option<String> = None;
            let mut outcome = None;
            let mut timed_out = false;

            for attempt in 1..=retry_attempts + 1 {
                match tokio::time::timeout(
                    timeout_per_file,
                    process_file(&deps, &path, &request_guid, check_duplicate_files),
                )
                .await
                {
                    Ok(Ok(result)) => {
                        outcome = Some(result);
                        break;
                    }
                    Ok(Err(err)) => {
                        last_error = Some(err.to_string());
                        if attempt <= retry_attempts {
                            tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                        }
                    }
                    Err(_) => {
                        timed_out = true;
                        last_error = Some(format!("timed out after {timeout_per_file:?}"));
                        break;
                    }
                }
            }

            let path_display = path.display().to_string();
            match outcome {
                Some(result) => {
                    files_succeeded.fetch_add(1, Ordering::Relaxed);
                    let mut totals = counters.lock().await;
                    totals.files += 1;
                    totals.pages += result.pages;
                    totals.tickets_created += result.tickets_created;
                    totals.review_queue_count += result.review_queue_count;
                    totals.error_count += result.errors;
                    drop(totals);
                    if let Some(tx) = &progress {
                        let _ = tx.send(BatchEvent::FileCompleted { path: path_display }).await;
                    }
                }
                None => {
                    files_failed.fetch_add(1, Ordering::Relaxed);
                    {
                        let mut totals = counters.lock().await;
                        totals.files += 1;
                        totals.error_count += 1;
                    }
                    let reason = last_error.unwrap_or_else(|| "unknown failure".to_string());
                    if let Some(tx) = &progress {
                        let event = if timed_out {
                            BatchEvent::FileTimedOut { path: path_display, reason }
                        } else {
                            BatchEvent::FileFailed { path: path_display, reason }
                        };
                        let _ = tx.send(event).await;
                    }
                    if !continue_on_error {
                        cancel.store(true, Ordering::Relaxed);
                    }
                }
            }

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 || done == total {
                tracing::info!(done, total, "batch progress");
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.await;
    }

    let final_counters = *counters.lock().await;
    let succeeded = files_succeeded.load(Ordering::Relaxed);
    let failed = files_failed.load(Ordering::Relaxed);

    let status = if failed == 0 {
        RunStatus::Completed
    } else if succeeded > 0 {
        RunStatus::Partial
    } else {
        RunStatus::Failed
    };

    match status {
        RunStatus::Failed => runs.fail_run(run_id, &final_counters).await?,
        _ => runs.complete_run(run_id, &final_counters).await?,
    }

    Ok(BatchResult { status, request_guid, files_total: files.len(), files_succeeded: succeeded, files_failed: failed, counters: final_counters })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_files_filters_by_suffix_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"x").unwrap();
        let files = discover_files(dir.path(), "*.pdf");
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap().to_string()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }
}
