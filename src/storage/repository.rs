//! Repository Pattern for the last observed JEP states
//!
//! The watcher only needs to know the last state it announced for each JEP
//! number. The [`EntryRepository`] trait keeps the change detector and the
//! pipeline independent of where that snapshot lives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              ChangeDetector / UpdatePipeline                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                EntryRepository (by number)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                           │
//!                  ▼                           ▼
//!        ┌─────────────────┐         ┌─────────────────┐
//!        │     SQLite      │         │      Mock       │
//!        │  Implementation │         │ Implementation  │
//!        └─────────────────┘         └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use jepwatch::storage::repository::{EntryRepository, SqliteEntryRepository};
//!
//! let repo = SqliteEntryRepository::new("data/jeps.db")?;
//! if repo.find_by_number("470")?.is_none() {
//!     // never announced
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Entry, EntryKind, EntryState};

// ============================================================================
// Repository Trait
// ============================================================================

/// Store of the last announced state per JEP number
pub trait EntryRepository: Send + Sync {
    /// Get the persisted entry for a number
    fn find_by_number(&self, number: &str) -> Result<Option<Entry>>;

    /// Insert or replace the entry under its number
    ///
    /// Entries without a number cannot be saved.
    fn save(&self, entry: &Entry) -> Result<()>;

    /// Number of persisted entries
    fn count(&self) -> Result<usize>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of EntryRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteEntryRepository {
    conn: Mutex<Connection>,
}

impl SqliteEntryRepository {
    /// Open (or create) the database at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS entries (
                    number TEXT PRIMARY KEY,
                    kind TEXT NOT NULL,
                    state TEXT NOT NULL,
                    release TEXT,
                    component TEXT,
                    sub_component TEXT,
                    title TEXT,
                    updated_at TEXT NOT NULL
                );
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn find_by_number(&self, number: &str) -> Result<Option<Entry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT kind, state, release, component, sub_component, title
                 FROM entries WHERE number = ?1",
                params![number],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()
            .context("Failed to load entry")?;

        let Some((kind, state, release, component, sub_component, title)) = row else {
            return Ok(None);
        };

        let kind: EntryKind = kind
            .parse()
            .map_err(|e: String| anyhow!("Corrupt entry {number}: {e}"))?;
        let state: EntryState = state
            .parse()
            .map_err(|e: String| anyhow!("Corrupt entry {number}: {e}"))?;

        Ok(Some(Entry {
            kind,
            state,
            release,
            component,
            sub_component,
            number: Some(number.to_string()),
            title,
        }))
    }

    fn save(&self, entry: &Entry) -> Result<()> {
        let number = entry
            .number
            .as_deref()
            .ok_or_else(|| anyhow!("Cannot persist an entry without a number"))?;

        let conn = self.lock()?;
        conn.execute(
            r#"
                INSERT INTO entries (number, kind, state, release, component, sub_component, title, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(number) DO UPDATE SET
                    kind = excluded.kind,
                    state = excluded.state,
                    release = excluded.release,
                    component = excluded.component,
                    sub_component = excluded.sub_component,
                    title = excluded.title,
                    updated_at = excluded.updated_at
                "#,
            params![
                number,
                entry.kind.as_str(),
                entry.state.as_str(),
                entry.release,
                entry.component,
                entry.sub_component,
                entry.title,
                Utc::now().to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to save entry {number}"))?;

        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of EntryRepository
///
/// Useful for testing without database dependencies.
pub struct MockEntryRepository {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MockEntryRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a repository already holding `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.entries.write().unwrap_or_else(|e| e.into_inner());
            for entry in entries {
                if let Some(number) = entry.number.clone() {
                    map.insert(number, entry);
                }
            }
        }
        repo
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockEntryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryRepository for MockEntryRepository {
    fn find_by_number(&self, number: &str) -> Result<Option<Entry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("Entry map lock poisoned"))?;
        Ok(entries.get(number).cloned())
    }

    fn save(&self, entry: &Entry) -> Result<()> {
        let number = entry
            .number
            .clone()
            .ok_or_else(|| anyhow!("Cannot persist an entry without a number"))?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Entry map lock poisoned"))?;
        entries.insert(number, entry.clone());
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedEntryRepository = Arc<dyn EntryRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedEntryRepository> {
    let repo = SqliteEntryRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedEntryRepository {
    Arc::new(MockEntryRepository::new())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_repos() -> Vec<Box<dyn EntryRepository>> {
        vec![
            Box::new(SqliteEntryRepository::in_memory().unwrap()),
            Box::new(MockEntryRepository::new()),
        ]
    }

    fn sample() -> Entry {
        Entry::new(EntryKind::Feature, EntryState::Candidate)
            .with_number("470")
            .with_component("security", Some("crypto"))
            .with_title("PEM Encodings of Cryptographic Objects")
    }

    #[test]
    fn test_find_missing() {
        for repo in create_test_repos() {
            assert!(repo.find_by_number("470").unwrap().is_none());
            assert_eq!(repo.count().unwrap(), 0);
        }
    }

    #[test]
    fn test_save_and_find() {
        for repo in create_test_repos() {
            repo.save(&sample()).unwrap();
            assert_eq!(repo.find_by_number("470").unwrap(), Some(sample()));
        }
    }

    #[test]
    fn test_save_replaces_by_number() {
        for repo in create_test_repos() {
            repo.save(&sample()).unwrap();

            let mut targeted = sample().with_release("25");
            targeted.state = EntryState::Targeted;
            targeted.sub_component = None;
            repo.save(&targeted).unwrap();

            assert_eq!(repo.count().unwrap(), 1);
            assert_eq!(repo.find_by_number("470").unwrap(), Some(targeted));
        }
    }

    #[test]
    fn test_save_without_number_fails() {
        for repo in create_test_repos() {
            let entry = Entry::new(EntryKind::Feature, EntryState::Drafted);
            assert!(repo.save(&entry).is_err());
            assert_eq!(repo.count().unwrap(), 0);
        }
    }

    #[test]
    fn test_sqlite_file_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jeps.db");

        {
            let repo = SqliteEntryRepository::new(&path).unwrap();
            repo.save(&sample()).unwrap();
        }

        let reopened = SqliteEntryRepository::new(&path).unwrap();
        assert_eq!(reopened.find_by_number("470").unwrap(), Some(sample()));
    }

    #[test]
    fn test_mock_with_entries() {
        let repo = MockEntryRepository::with_entries([
            sample(),
            Entry::new(EntryKind::Process, EntryState::Drafted),
        ]);
        assert_eq!(repo.len(), 1);
    }
}
