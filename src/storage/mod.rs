//! Persistence of announced JEP states
//!
//! Only the last announced state of each JEP is kept, keyed by number.

pub mod repository;

pub use repository::{
    create_mock_repository, create_sqlite_repository, EntryRepository, MockEntryRepository,
    SharedEntryRepository, SqliteEntryRepository,
};
