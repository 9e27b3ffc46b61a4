//! Sequential batch job: named prompts in, one file per name out.

mod item;
mod runner;
mod summary;

pub use item::{load_manifest, parse_manifest, validate_items, WorkItem};
pub use runner::{BatchObserver, BatchRunner, TransferPolicy};
pub use summary::{ItemFailure, ItemOutcome, JobSummary};
