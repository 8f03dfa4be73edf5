//! Repository layer for database persistence.
//!
//! Grounded on `repository/mod.rs`'s role as a thin aggregation point over
//! per-entity repositories; the connection-pooling and backend-dispatch
//! machinery itself lives in [`pool`] and is shared by every repository
//! below rather than re-derived per entity.

pub mod convert;
mod pool;
mod processing_run;
mod reference;
mod review_queue;
pub mod seed;
mod tickets;
mod util;

pub use pool::{DbError, DbPool};
pub use processing_run::ProcessingRunRepository;
pub use reference::ReferenceRepository;
pub use review_queue::ReviewQueueRepository;
pub use tickets::{CreateOptions, TicketRepository};
pub use util::{is_postgres_url, redact_url_password, validate_database_url};
