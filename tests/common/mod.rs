//! Common test utilities

use jepwatch::models::{Entry, EntryKind, EntryState};

/// Entries in `tests/fixtures/jeps_sample.html`
#[allow(dead_code)]
pub const SAMPLE_ENTRY_COUNT: usize = 11;

/// Entries of the sample with a number and a state past SUBMITTED
#[allow(dead_code)]
pub const SAMPLE_ELIGIBLE_COUNT: usize = 9;

/// Load a fixture file from `tests/fixtures`
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

/// Wrap rows in a minimal index page
#[allow(dead_code)]
pub fn index_page(rows: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>JEP 0: JEP Index</title></head>
<body><table class="jeps">{rows}</table></body>
</html>"#
    )
}

/// Render a data row the way the index does
#[allow(dead_code)]
pub fn row(
    kind: &str,
    state: &str,
    release: &str,
    component: &str,
    number: &str,
    title: &str,
) -> String {
    let component = match component.split_once('/') {
        Some((left, right)) => format!(
            r#"<span class="cl">{left}</span><span class="cm">/</span><span class="cr">{right}</span>"#
        ),
        None => format!(r#"<span class="cl">{component}</span>"#),
    };
    format!(
        r#"<tr><td class="tc">{kind}</td><td class="sc">{state}</td><td class="rl">{release}</td><td class="cm">{component}</td><td class="jep">{number}</td><td><a href="{number}">{title}</a></td></tr>"#
    )
}

/// The JEP 470 entry used throughout the tests
#[allow(dead_code)]
pub fn pem_entry(state: EntryState) -> Entry {
    Entry::new(EntryKind::Feature, state)
        .with_number("470")
        .with_release("25")
        .with_component("security", Some("security"))
        .with_title("PEM Encodings of Cryptographic Objects (Preview)")
}

/// Create an entry with a number and state
#[allow(dead_code)]
pub fn entry_with_number(number: &str, state: EntryState) -> Entry {
    Entry::new(EntryKind::Feature, state)
        .with_number(number)
        .with_title(format!("Feature {number}"))
}
