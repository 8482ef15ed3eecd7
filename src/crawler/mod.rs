//! Fetching the JEP index and running watch cycles
//!
//! [`fetcher`] is the document transport; [`pipeline`] drives one cycle from
//! fetch to persistence.

pub mod fetcher;
pub mod pipeline;

pub use fetcher::TableFetcher;
pub use pipeline::{CycleOutcome, CycleReport, EntryFailure, NumberLocks, UpdatePipeline};
