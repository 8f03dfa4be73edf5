//! CLI command surface (`ticketctl`) — the runnable skeleton around the
//! core: migrations, reference-data seeding, the batch runner, and a
//! review-queue inspector (SPEC_FULL §1 names these in-scope even though
//! concrete export writers and OCR-backend argument parsing are not).
//!
//! Grounded on `cli/commands.rs`'s `Cli`/`Commands` derive shape and
//! `is_verbose()` early-logging helper.

mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::batch::{BatchDeps, BatchEvent};
use crate::config::{DatabaseSource, PipelineConfig};
use crate::models::{RunStatus, TicketTypeName};
use crate::normalize::SynonymNormalizer;
use crate::ocr::FallbackAdapter;
use crate::repository::{seed, DbPool, ProcessingRunRepository, ReferenceRepository, ReviewQueueRepository};

const DEFAULT_EMBEDDED_DB: &str = "truckticket.sqlite";

#[derive(Parser)]
#[command(name = "ticketctl")]
#[command(about = "Truck ticket ingestion pipeline: migrate, seed, batch-process, inspect review queue")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file (spec §6 configuration surface).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Explicit database connection string, overriding config/env resolution.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database schema and reference-data management.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Process a directory of input files through the batch orchestrator.
    Batch {
        /// Directory to scan for input files (recursive).
        input_dir: PathBuf,

        /// Override the job code from config (spec §6 default "24-105").
        #[arg(long)]
        job_code: Option<String>,

        /// Number of worker slots; defaults to host CPU count.
        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Inspect the review queue (C12).
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },

    /// Inspect the processing-run ledger (C11).
    Runs {
        /// Number of most-recent runs to show.
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Apply all pending `cetane` migrations.
    Migrate,
    /// Idempotently seed canonical reference rows (jobs, materials, ...).
    Seed {
        /// Job code to seed if not already present.
        #[arg(long, default_value = "24-105")]
        job_code: String,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// List unresolved review-queue entries, severity-ordered.
    List,
    /// Mark a review-queue entry resolved.
    Resolve {
        id: i64,
        #[arg(long, default_value = "ticketctl")]
        resolved_by: String,
    },
}

/// Check if verbose mode is enabled (for early logging setup, before clap
/// has parsed argv).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

async fn load_config(path: Option<&PathBuf>) -> PipelineConfig {
    match path {
        Some(path) => match PipelineConfig::load_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to load config file, using defaults");
                PipelineConfig::default_with_env()
            }
        },
        None => PipelineConfig::load().await,
    }
}

fn resolve_database_url(config: &PipelineConfig, override_url: Option<&str>) -> anyhow::Result<String> {
    let source = DatabaseSource::resolve(
        override_url.or(config.database_url.as_deref()),
        &PathBuf::from(DEFAULT_EMBEDDED_DB),
    )?;
    Ok(source.connection_string())
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref()).await;
    let database_url = resolve_database_url(&config, cli.database_url.as_deref())?;
    let pool = DbPool::from_url(&database_url)?;

    match cli.command {
        Commands::Db { command } => run_db(command, &database_url, &pool).await,
        Commands::Batch { input_dir, job_code, max_workers } => {
            run_batch(&input_dir, job_code, max_workers, &config, pool).await
        }
        Commands::Review { command } => run_review(command, &pool).await,
        Commands::Runs { limit } => run_runs(limit, &pool).await,
    }
}

async fn run_db(command: DbCommands, database_url: &str, pool: &DbPool) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            crate::migrations::run_migrations(database_url).await?;
            println!("{}", helpers::success("migrations applied"));
        }
        DbCommands::Seed { job_code } => {
            let reference = ReferenceRepository::new(pool.clone());
            seed::seed_defaults(&reference, &job_code).await?;
            println!("{}", helpers::success(&format!("seeded reference data for job {job_code}")));
        }
    }
    Ok(())
}

async fn run_batch(
    input_dir: &std::path::Path,
    job_code: Option<String>,
    max_workers: Option<usize>,
    config: &PipelineConfig,
    pool: DbPool,
) -> anyhow::Result<()> {
    let job_code = job_code.unwrap_or_else(|| config.job_code.clone());
    let default_ticket_type = TicketTypeName::parse(&config.ticket_type_name).unwrap_or(TicketTypeName::Export);

    let deps = BatchDeps {
        pool: pool.clone(),
        ocr: std::sync::Arc::new(FallbackAdapter),
        vendor_templates: std::sync::Arc::new(Vec::new()),
        normalizer: std::sync::Arc::new(SynonymNormalizer::new(Default::default())),
        image_producer: None,
        processed_by: whoami_fallback(),
        job_code,
        default_ticket_type,
    };

    let mut batch_config = config.to_batch_config("*.pdf");
    if let Some(workers) = max_workers {
        batch_config.max_workers = Some(workers);
    }

    let runs = ProcessingRunRepository::new(pool);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<BatchEvent>(64);
    let progress_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::FileCompleted { path } => tracing::info!(%path, "file completed"),
                BatchEvent::FileFailed { path, reason } => tracing::warn!(%path, %reason, "file failed"),
                BatchEvent::FileTimedOut { path, reason } => tracing::warn!(%path, %reason, "file timed out"),
            }
        }
    });

    let result = crate::batch::run_batch(deps, input_dir, batch_config, &runs, Some(tx)).await?;
    let _ = progress_task.await;

    println!("{}", helpers::batch_summary(&result));
    if !matches!(result.status, RunStatus::Completed) {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_review(command: ReviewCommands, pool: &DbPool) -> anyhow::Result<()> {
    let review_queue = ReviewQueueRepository::new(pool.clone());
    match command {
        ReviewCommands::List => {
            let mut entries = review_queue.get_unresolved().await?;
            entries.sort_by_key(|e| e.severity);
            for entry in &entries {
                println!("{}", helpers::review_line(entry));
            }
            if entries.is_empty() {
                println!("{}", helpers::success("review queue is empty"));
            }
        }
        ReviewCommands::Resolve { id, resolved_by } => {
            review_queue.resolve(id, &resolved_by).await?;
            println!("{}", helpers::success(&format!("resolved review entry {id}")));
        }
    }
    Ok(())
}

async fn run_runs(limit: i64, pool: &DbPool) -> anyhow::Result<()> {
    let runs = ProcessingRunRepository::new(pool.clone());
    let recent = runs.get_recent(limit).await?;
    for run in &recent {
        println!("{}", helpers::run_line(run));
    }
    Ok(())
}

/// `whoami`/`getlogin` are not part of the teacher's dependency stack; the
/// `USER` environment variable (present on every POSIX CI/dev host this
/// crate targets) is what the repository layer's `processed_by` column
/// expects, falling back to a fixed label when unset.
fn whoami_fallback() -> String {
    std::env::var("USER").unwrap_or_else(|_| "ticketctl".to_string())
}
