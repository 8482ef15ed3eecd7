//! Change detection against the SQLite repository

mod common;

use common::{entry_with_number, load_fixture, pem_entry, SAMPLE_ELIGIBLE_COUNT};
use jepwatch::models::EntryState;
use jepwatch::parser::TableParser;
use jepwatch::storage::{EntryRepository, SqliteEntryRepository};
use jepwatch::tracker::{ChangeDetector, ChangeKind};

#[test]
fn test_everything_is_new_on_empty_repository() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    let entries = TableParser::new().parse_html(&load_fixture("jeps_sample.html"));

    let changes = ChangeDetector::new(&repo).detect(&entries);
    assert_eq!(changes.len(), SAMPLE_ELIGIBLE_COUNT);
    assert!(changes.iter().all(|c| c.kind == ChangeKind::New));
}

#[test]
fn test_saved_entries_are_not_changes() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    let entries = TableParser::new().parse_html(&load_fixture("jeps_sample.html"));

    for change in ChangeDetector::new(&repo).detect(&entries) {
        repo.save(&change.entry).unwrap();
    }

    assert_eq!(repo.count().unwrap(), SAMPLE_ELIGIBLE_COUNT);
    assert!(ChangeDetector::new(&repo).detect(&entries).is_empty());
}

#[test]
fn test_state_transition_reports_previous_state() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    repo.save(&pem_entry(EntryState::Candidate)).unwrap();

    let detector = ChangeDetector::new(&repo);
    let kind = detector
        .classify(&pem_entry(EntryState::ProposedToTarget))
        .unwrap();

    assert_eq!(
        kind,
        Some(ChangeKind::StateChanged {
            previous: EntryState::Candidate
        })
    );
}

#[test]
fn test_field_edits_without_state_change_are_ignored() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    repo.save(&pem_entry(EntryState::Targeted)).unwrap();

    let edited = pem_entry(EntryState::Targeted)
        .with_title("PEM Encodings of Cryptographic Objects")
        .with_release("26");
    assert_eq!(ChangeDetector::new(&repo).classify(&edited).unwrap(), None);
}

#[test]
fn test_submitted_entries_are_never_changes() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    let submitted = entry_with_number("8300001", EntryState::Submitted);

    assert_eq!(ChangeDetector::new(&repo).classify(&submitted).unwrap(), None);
    assert!(ChangeDetector::new(&repo).detect(&[submitted]).is_empty());
}

#[test]
fn test_saved_entry_round_trips_all_fields() {
    let repo = SqliteEntryRepository::in_memory().unwrap();
    let entry = pem_entry(EntryState::Integrated);
    repo.save(&entry).unwrap();

    assert_eq!(repo.find_by_number("470").unwrap(), Some(entry));
}
