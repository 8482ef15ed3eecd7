//! Text cleanup for table cell contents
//!
//! Cell text in the JEP index is copied out of the DOM with all of the
//! source indentation, non-breaking spaces and the occasional invisible
//! character. These helpers normalise it before it reaches the model.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\u{00A0}]+").expect("whitespace pattern is valid")
});

/// Placeholder the index uses for an empty component column
pub const COMPONENT_PLACEHOLDER: &str = "—";

/// Clean extracted cell text
///
/// Removes zero-width characters, collapses every whitespace run
/// (including newlines and non-breaking spaces) to a single space and trims.
///
/// # Examples
///
/// ```
/// use jepwatch::parser::sanitize::clean_cell_text;
///
/// assert_eq!(clean_cell_text("\n   PEM\u{00A0}Encodings \u{200B}\n"), "PEM Encodings");
/// ```
pub fn clean_cell_text(text: &str) -> String {
    let visible = remove_zero_width(text);
    WHITESPACE_REGEX
        .replace_all(&visible, " ")
        .trim()
        .to_string()
}

/// Remove zero-width spaces and similar invisible characters
///
/// # Examples
///
/// ```
/// use jepwatch::parser::sanitize::remove_zero_width;
///
/// assert_eq!(remove_zero_width("4\u{200B}70\u{FEFF}"), "470");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2060}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Blank text becomes `None`
pub fn value_or_none(text: &str) -> Option<String> {
    let cleaned = clean_cell_text(text);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Like [`value_or_none`], but the em-dash placeholder is also absent
pub fn component_or_none(text: &str) -> Option<String> {
    value_or_none(text).filter(|value| value != COMPONENT_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cell_text_collapses_whitespace() {
        assert_eq!(clean_cell_text("  a \t b\n\nc  "), "a b c");
        assert_eq!(clean_cell_text(""), "");
        assert_eq!(clean_cell_text(" \u{00A0} "), "");
    }

    #[test]
    fn test_value_or_none() {
        assert_eq!(value_or_none("25"), Some("25".to_string()));
        assert_eq!(value_or_none("   "), None);
        assert_eq!(value_or_none("\u{200B}"), None);
    }

    #[test]
    fn test_component_placeholder_is_absent() {
        assert_eq!(component_or_none("—"), None);
        assert_eq!(component_or_none("  —  "), None);
        assert_eq!(component_or_none(""), None);
        assert_eq!(component_or_none("core"), Some("core".to_string()));
        // A plain hyphen is real text, not the placeholder
        assert_eq!(component_or_none("-"), Some("-".to_string()));
    }
}
