//! jepwatch - OpenJDK JEP index watcher
//!
//! Watches the JEP index table and posts a Bluesky update whenever a JEP
//! appears or moves to another lifecycle state.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Index fetching and the per-cycle pipeline
//! - [`parser`] - HTML table parsing
//! - [`models`] - Core data structures and types
//! - [`tracker`] - Change detection against announced states
//! - [`notifications`] - Message rendering, link facets and the Bluesky channel
//! - [`storage`] - SQLite persistence of announced states
//! - [`scheduler`] - Interval-driven cycle runner
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use jepwatch::config::Config;
//! use jepwatch::crawler::{TableFetcher, UpdatePipeline};
//! use jepwatch::storage::create_sqlite_repository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = TableFetcher::new(&config.source)?;
//!     let repository = create_sqlite_repository(&config.database.sqlite_path)?;
//!     let report = UpdatePipeline::dry_run(fetcher, repository).run_cycle().await;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod scheduler;
pub mod storage;
pub mod tracker;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CycleReport, TableFetcher, UpdatePipeline};
    pub use crate::error::{Error, ErrorCategory, Result, WatchErrorTrait};
    pub use crate::models::{Entry, EntryKind, EntryState};
    pub use crate::notifications::{extract_facets, format_update, BlueskyChannel, Facet};
    pub use crate::parser::TableParser;
    pub use crate::storage::{EntryRepository, SqliteEntryRepository};
    pub use crate::tracker::{Change, ChangeDetector, ChangeKind};
}

// Direct re-exports for convenience
pub use models::{Entry, EntryKind, EntryState};
