//! Change detection against the last announced state
//!
//! A parsed entry is compared with what the repository holds for its number.
//! Only entries with a number and a state past SUBMITTED take part: before
//! that an entry has no stable identity on the index.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Entry, EntryState};
use crate::storage::EntryRepository;

/// Why an entry needs an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// Number never announced
    New,
    /// Announced before, in another state
    StateChanged { previous: EntryState },
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::StateChanged { previous } => write!(f, "state changed from {previous}"),
        }
    }
}

/// A parsed entry that differs from the persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Freshly parsed entry, persisted as a whole once announced
    pub entry: Entry,
    pub kind: ChangeKind,
}

impl Change {
    pub fn number(&self) -> &str {
        self.entry.display_number()
    }
}

/// Whether an entry can be tracked at all
pub fn is_eligible(entry: &Entry) -> bool {
    entry.number.is_some() && entry.state != EntryState::Submitted
}

/// Compares parsed entries with a repository
pub struct ChangeDetector<'a, R: EntryRepository + ?Sized> {
    repository: &'a R,
}

impl<'a, R: EntryRepository + ?Sized> ChangeDetector<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    /// Classify one entry against the repository
    ///
    /// Ineligible entries and entries whose state matches the snapshot give
    /// `None`. Only the state is compared; other field edits are not news.
    pub fn classify(&self, entry: &Entry) -> Result<Option<ChangeKind>> {
        if !is_eligible(entry) {
            return Ok(None);
        }
        let Some(number) = entry.number.as_deref() else {
            return Ok(None);
        };

        let kind = match self.repository.find_by_number(number)? {
            None => Some(ChangeKind::New),
            Some(existing) if existing.state != entry.state => Some(ChangeKind::StateChanged {
                previous: existing.state,
            }),
            Some(_) => None,
        };
        Ok(kind)
    }

    /// Changes among `entries`, in input order
    ///
    /// A lookup failure for one entry is logged and that entry skipped, so a
    /// single bad record never hides the others.
    pub fn detect(&self, entries: &[Entry]) -> Vec<Change> {
        let mut changes = Vec::new();

        for entry in entries.iter().filter(|e| is_eligible(e)) {
            match self.classify(entry) {
                Ok(Some(kind)) => {
                    tracing::debug!(number = %entry.display_number(), change = %kind, "Detected change");
                    changes.push(Change {
                        entry: entry.clone(),
                        kind,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        number = %entry.display_number(),
                        error = %e,
                        "Failed to look up persisted entry"
                    );
                }
            }
        }

        changes
    }
}
