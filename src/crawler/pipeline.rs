//! One watch cycle over the JEP index
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐   ┌─────────┐   ┌──────────┐   ┌───────────────────────────────┐
//! │  Fetch  │──▶│  Parse  │──▶│  Detect  │──▶│ per change, under number lock │
//! └─────────┘   └─────────┘   └──────────┘   │ re-classify → post → save     │
//!                                            └───────────────────────────────┘
//! ```
//!
//! An entry is saved only after the channel accepted its post, so a failed
//! post is retried on the next cycle. The per-number lock lets two
//! overlapping cycles run against the same repository without announcing
//! the same change twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jepwatch::crawler::pipeline::UpdatePipeline;
//!
//! let pipeline = UpdatePipeline::new(fetcher, repository, Arc::new(channel));
//! let report = pipeline.run_cycle().await;
//! println!("{report}");
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::crawler::fetcher::TableFetcher;
use crate::error::{Error, ErrorCategory, WatchErrorTrait};
use crate::models::Entry;
use crate::notifications::{Channel, Notification};
use crate::parser::TableParser;
use crate::storage::SharedEntryRepository;
use crate::tracker::{is_eligible, ChangeDetector, ChangeKind};

// ============================================================================
// Per-number locking
// ============================================================================

/// One async mutex per JEP number
///
/// Locks are created on first use and kept for the life of the process;
/// the index holds a few hundred numbers.
#[derive(Debug, Default)]
pub struct NumberLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl NumberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `number`
    pub fn lock_for(&self, number: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(number.to_string()).or_default())
    }

    /// Number of distinct numbers seen so far
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Cycle Report
// ============================================================================

/// How a cycle ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The index was fetched and every change was handled
    #[default]
    Completed,
    /// The index could not be fetched; nothing was parsed or saved
    FetchFailed {
        error: String,
        category: ErrorCategory,
        recoverable: bool,
    },
}

/// A change that could not be announced or saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub number: String,
    pub category: ErrorCategory,
    /// The next cycle retries it and may succeed
    pub recoverable: bool,
    pub message: String,
}

impl EntryFailure {
    fn from_error(number: &str, error: &Error) -> Self {
        Self {
            number: number.to_string(),
            category: error.category(),
            recoverable: error.is_recoverable(),
            message: error.user_message(),
        }
    }
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JEP {} [{}]: {}", self.number, self.category, self.message)
    }
}

/// Summary of a cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Entries read from the table
    pub parsed: usize,
    /// Entries with a number and a state past SUBMITTED
    pub eligible: usize,
    /// Entries that differed from the snapshot
    pub changes: usize,
    /// Posted and saved
    pub posted: usize,
    /// Post or save failed; retried next cycle
    pub failed: usize,
    /// Already handled by an overlapping cycle, or lookup failed
    pub skipped: usize,
    /// Why each failed or unreadable change did not go through
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EntryFailure>,
    /// Rendered notifications, only filled in dry-run mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previews: Vec<Notification>,
    pub duration_ms: u64,
}

impl CycleReport {
    /// Whether the cycle reached the posting stage
    pub fn is_completed(&self) -> bool {
        self.outcome == CycleOutcome::Completed
    }

    /// Whether some failure will repeat until someone intervenes
    pub fn needs_attention(&self) -> bool {
        match &self.outcome {
            CycleOutcome::FetchFailed { recoverable, .. } => !recoverable,
            CycleOutcome::Completed => self.failures.iter().any(|f| !f.recoverable),
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CycleOutcome::Completed => write!(
                f,
                "parsed {} entries ({} eligible), {} changes: {} posted, {} failed, {} skipped",
                self.parsed, self.eligible, self.changes, self.posted, self.failed, self.skipped
            ),
            CycleOutcome::FetchFailed { error, .. } => write!(f, "{error}"),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Fetch, detect, announce and persist
pub struct UpdatePipeline {
    fetcher: TableFetcher,
    parser: TableParser,
    repository: SharedEntryRepository,
    /// `None` renders without posting or saving
    channel: Option<Arc<dyn Channel>>,
    locks: NumberLocks,
}

impl UpdatePipeline {
    /// Pipeline that posts through `channel`
    pub fn new(
        fetcher: TableFetcher,
        repository: SharedEntryRepository,
        channel: Arc<dyn Channel>,
    ) -> Self {
        Self {
            fetcher,
            parser: TableParser::new(),
            repository,
            channel: Some(channel),
            locks: NumberLocks::new(),
        }
    }

    /// Pipeline that renders changes but never posts or saves
    pub fn dry_run(fetcher: TableFetcher, repository: SharedEntryRepository) -> Self {
        Self {
            fetcher,
            parser: TableParser::new(),
            repository,
            channel: None,
            locks: NumberLocks::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.channel.is_none()
    }

    /// Run one full cycle
    ///
    /// Never fails: a fetch error ends the cycle with
    /// [`CycleOutcome::FetchFailed`] and leaves the repository untouched.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();

        let html = match self.fetcher.fetch_text().await {
            Ok(html) => html,
            Err(e) => {
                let error = Error::from(e);
                tracing::error!(
                    url = %self.fetcher.url(),
                    category = %error.category(),
                    recoverable = error.is_recoverable(),
                    error = %error,
                    "Failed to fetch JEP index"
                );
                return CycleReport {
                    outcome: CycleOutcome::FetchFailed {
                        error: error.user_message(),
                        category: error.category(),
                        recoverable: error.is_recoverable(),
                    },
                    duration_ms: started.elapsed().as_millis() as u64,
                    ..Default::default()
                };
            }
        };

        let entries = self.parser.parse_html(&html);
        let mut report = self.process_entries(&entries).await;
        report.duration_ms = started.elapsed().as_millis() as u64;
        report
    }

    /// Detect and announce changes among already parsed entries
    pub async fn process_entries(&self, entries: &[Entry]) -> CycleReport {
        let mut report = CycleReport {
            parsed: entries.len(),
            eligible: entries.iter().filter(|e| is_eligible(e)).count(),
            ..Default::default()
        };

        let changes = ChangeDetector::new(self.repository.as_ref()).detect(entries);
        report.changes = changes.len();

        for change in changes {
            let number = change.number().to_string();
            let lock = self.locks.lock_for(&number);
            let _guard = lock.lock().await;

            // Another cycle may have announced it while we waited
            let kind = match ChangeDetector::new(self.repository.as_ref()).classify(&change.entry) {
                Ok(Some(kind)) => kind,
                Ok(None) => {
                    tracing::debug!(number = %number, "Change already handled");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(
                        number = %number,
                        category = %e.category(),
                        error = %e,
                        "Failed to re-check entry"
                    );
                    report.failures.push(EntryFailure::from_error(&number, &e));
                    report.skipped += 1;
                    continue;
                }
            };

            if self.announce(&change.entry, kind, &mut report).await {
                report.posted += 1;
            } else if self.channel.is_some() {
                report.failed += 1;
            }
        }

        tracing::info!(
            parsed = report.parsed,
            changes = report.changes,
            posted = report.posted,
            failed = report.failed,
            dry_run = self.is_dry_run(),
            "Cycle finished"
        );
        report
    }

    /// Post one change and save it on success
    async fn announce(&self, entry: &Entry, kind: ChangeKind, report: &mut CycleReport) -> bool {
        let notification = Notification::for_entry(entry);
        tracing::info!(
            number = %entry.display_number(),
            state = %entry.state,
            change = %kind,
            "Announcing JEP update"
        );

        let Some(channel) = &self.channel else {
            report.previews.push(notification);
            return false;
        };

        let number = entry.display_number();
        match channel.send(&notification).await {
            Ok(status) if status.delivered => {}
            Ok(status) => {
                report.failures.push(EntryFailure {
                    number: number.to_string(),
                    category: ErrorCategory::Delivery,
                    recoverable: status.retryable,
                    message: status.to_string(),
                });
                return false;
            }
            Err(e) => {
                let error = Error::from(e);
                tracing::error!(
                    number = %number,
                    category = %error.category(),
                    recoverable = error.is_recoverable(),
                    error = %error,
                    "Channel error"
                );
                report.failures.push(EntryFailure::from_error(number, &error));
                return false;
            }
        }

        match self.repository.save(entry) {
            Ok(()) => true,
            Err(e) => {
                let error = Error::from(e);
                tracing::error!(
                    number = %number,
                    error = %error,
                    "Posted update but failed to save entry"
                );
                report.failures.push(EntryFailure::from_error(number, &error));
                false
            }
        }
    }
}
