//! ticketctl - truck ticket ingestion pipeline CLI.
//!
//! Migrates the database, seeds reference data, runs the batch orchestrator
//! over a directory of input files, and inspects the review queue and the
//! processing-run ledger.

mod batch;
mod cache;
mod cli;
mod config;
mod duplicate;
mod error;
mod export;
mod extract;
mod files;
mod imaging;
mod migrations;
mod models;
mod normalize;
mod ocr;
mod pipeline;
mod repository;
mod schema;
mod utils;
mod validate;
mod vendor;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ticketctl=info"
    } else {
        "ticketctl=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
