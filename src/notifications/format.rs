//! Notification text rendering
//!
//! Every update is rendered from the entry alone: a lead line that depends
//! on the lifecycle state, then a fixed-order body ending with a link back
//! to the JEP page.

use crate::models::{Entry, EntryState};

/// Link template used in the last line, without the scheme
pub const JEP_LINK_PREFIX: &str = "openjdk.org/jeps/";

/// Render the post text for an entry
///
/// The output always ends with a newline. A missing number is rendered as
/// `?`; a missing release drops the "JDK" suffix from the lead line.
///
/// # Example
///
/// ```
/// use jepwatch::models::{Entry, EntryKind, EntryState};
/// use jepwatch::notifications::format::format_update;
///
/// let entry = Entry::new(EntryKind::Feature, EntryState::Candidate)
///     .with_number("500")
///     .with_title("Example");
/// let text = format_update(&entry);
/// assert!(text.starts_with("🎓 JEP 500 moved to candidate\n"));
/// assert!(text.ends_with("See openjdk.org/jeps/500\n"));
/// ```
pub fn format_update(entry: &Entry) -> String {
    let mut lines = vec![lead_line(entry)];

    if let Some(title) = &entry.title {
        lines.push(format!("Title: {title}"));
    }

    lines.push(format!("Type: {}", entry.kind));

    match (&entry.component, &entry.sub_component) {
        (Some(component), Some(sub)) => lines.push(format!("Component: {component} / {sub}")),
        (Some(component), None) => lines.push(format!("Component: {component}")),
        (None, _) => {}
    }

    if let Some(release) = &entry.release {
        lines.push(format!("Release: {release}"));
    }

    lines.push(format!("See {JEP_LINK_PREFIX}{}", entry.display_number()));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// First line of the post, one per lifecycle state
pub fn lead_line(entry: &Entry) -> String {
    let number = entry.display_number();
    let target = |verb: &str| match &entry.release {
        Some(release) => format!("JEP {number} {verb} JDK {release}"),
        None => format!("JEP {number} {}", verb.trim_end_matches(" to")),
    };

    match entry.state {
        EntryState::Drafted => format!("✏️ JEP {number} was drafted"),
        EntryState::Submitted => format!("🗳️ JEP {number} was submitted"),
        EntryState::Candidate => format!("🎓 JEP {number} moved to candidate"),
        EntryState::ProposedToTarget => format!("🎯 {}", target("proposed to target")),
        EntryState::Targeted => format!("🎯 {}", target("updated to target")),
        EntryState::Integrated => format!("🏗️ {}", target("integrated to")),
        EntryState::ClosedDelivered => match &entry.release {
            None => format!("🪦 JEP {number} was withdrawn"),
            Some(release) => format!("📦 JEP {number} delivered to JDK {release}"),
        },
        EntryState::Completed => format!("✅ JEP {number} is now complete"),
        EntryState::Active => format!("✅ JEP {number} is now active"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn pem_entry() -> Entry {
        Entry::new(EntryKind::Feature, EntryState::Targeted)
            .with_number("470")
            .with_release("25")
            .with_component("security", Some("crypto"))
            .with_title("PEM Encodings of Cryptographic Objects")
    }

    #[test]
    fn test_full_message() {
        assert_eq!(
            format_update(&pem_entry()),
            "🎯 JEP 470 updated to target JDK 25\n\
             Title: PEM Encodings of Cryptographic Objects\n\
             Type: feature\n\
             Component: security / crypto\n\
             Release: 25\n\
             See openjdk.org/jeps/470\n"
        );
    }

    #[test]
    fn test_closed_without_release_is_withdrawn() {
        let entry = Entry::new(EntryKind::Feature, EntryState::ClosedDelivered).with_number("999");
        assert_eq!(lead_line(&entry), "🪦 JEP 999 was withdrawn");

        let delivered = entry.with_release("25");
        assert_eq!(lead_line(&delivered), "📦 JEP 999 delivered to JDK 25");
    }

    #[test]
    fn test_targeting_without_release_has_no_trailing_space() {
        let entry = Entry::new(EntryKind::Feature, EntryState::ProposedToTarget).with_number("1");
        assert_eq!(lead_line(&entry), "🎯 JEP 1 proposed to target");

        let targeted = Entry::new(EntryKind::Feature, EntryState::Targeted).with_number("1");
        assert_eq!(lead_line(&targeted), "🎯 JEP 1 updated to target");

        let integrated = Entry::new(EntryKind::Feature, EntryState::Integrated).with_number("1");
        assert_eq!(lead_line(&integrated), "🏗️ JEP 1 integrated");

        for state in EntryState::all() {
            let text = format_update(&Entry::new(EntryKind::Feature, state).with_number("1"));
            assert!(text.lines().all(|l| !l.ends_with(' ')), "{state}: {text:?}");
        }
    }

    #[test]
    fn test_optional_lines_are_omitted() {
        let entry = Entry::new(EntryKind::Process, EntryState::Active).with_number("1");
        assert_eq!(
            format_update(&entry),
            "✅ JEP 1 is now active\nType: process\nSee openjdk.org/jeps/1\n"
        );
    }

    #[test]
    fn test_component_without_sub_component() {
        let entry = Entry::new(EntryKind::Infrastructure, EntryState::Drafted)
            .with_number("8300000")
            .with_component("core", None);
        let text = format_update(&entry);
        assert!(text.contains("\nComponent: core\n"));
        assert!(text.contains("Type: infrastructure"));
    }

    #[test]
    fn test_sub_component_without_component_is_omitted() {
        let mut entry = Entry::new(EntryKind::Feature, EntryState::Candidate).with_number("2");
        entry.sub_component = Some("lang".to_string());
        assert!(!format_update(&entry).contains("Component"));
    }

    #[test]
    fn test_every_state_renders() {
        for state in EntryState::all() {
            let entry = Entry::new(EntryKind::Feature, state);
            let text = format_update(&entry);
            assert!(text.contains("JEP ?"), "{state}: {text}");
            assert!(text.ends_with("See openjdk.org/jeps/?\n"));
        }
    }

    #[test]
    fn test_title_with_quotes_is_kept_verbatim() {
        let entry = pem_entry().with_title("Say \"hello\"\nworld");
        assert!(format_update(&entry).contains("Title: Say \"hello\"\nworld\n"));
    }
}
