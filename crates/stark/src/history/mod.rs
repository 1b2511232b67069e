//! In-memory audit trail of job lifecycle events.

pub mod event;
pub mod ledger;

pub use event::{HistoryEvent, JobStatus};
pub use ledger::HistoryLedger;
