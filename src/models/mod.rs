//! Data model: reference entities, transactional tickets, review-queue
//! entries, and the processing-run ledger (spec §3).

pub mod processing_run;
pub mod reference;
pub mod review;
pub mod ticket;

pub use processing_run::{ProcessingRun, ProcessingStatistics, RunCounters, RunStatus};
pub use reference::{Destination, Job, Material, MaterialClass, Source, TicketType, TicketTypeName, Vendor};
pub use review::{NewReviewEntry, PageId, ReviewQueueEntry, Severity};
pub use ticket::{NewTicket, QuantityUnit, TruckTicket};
