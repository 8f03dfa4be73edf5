//! Validated relational ingestion of scanned trucking/waste-disposal
//! tickets: OCR field extraction, vendor detection, manifest validation,
//! duplicate detection, and durable persistence behind a batch orchestrator.

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod export;
pub mod extract;
pub mod files;
pub mod imaging;
pub mod migrations;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod utils;
pub mod validate;
pub mod vendor;

pub use error::TicketError;
