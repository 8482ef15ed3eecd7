//! Rich-text link facets
//!
//! Bluesky addresses rich-text spans by UTF-8 byte offset into the post
//! text. Lead lines start with emoji, so character positions and byte
//! positions diverge as soon as a post is rendered.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Deep links to a JEP page, capturing the number
static JEP_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"openjdk\.org/jeps/(\d+)").expect("Invalid regex pattern"));

/// Canonical target of a JEP link
const JEP_URI_PREFIX: &str = "https://openjdk.org/jeps/";

/// A link span over a post text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Inclusive start, in bytes
    pub byte_start: usize,
    /// Exclusive end, in bytes
    pub byte_end: usize,
    pub uri: String,
}

/// Find every JEP link in `text`, left to right
///
/// Matches never overlap. The URI is rebuilt from the captured number so
/// the facet always targets the https page.
///
/// # Example
///
/// ```
/// use jepwatch::notifications::facets::extract_facets;
///
/// let facets = extract_facets("🎯 See openjdk.org/jeps/470");
/// assert_eq!(facets.len(), 1);
/// assert_eq!(facets[0].byte_start, 9);
/// assert_eq!(facets[0].uri, "https://openjdk.org/jeps/470");
/// ```
pub fn extract_facets(text: &str) -> Vec<Facet> {
    JEP_LINK_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let link = caps.get(0)?;
            let number = caps.get(1)?;
            Some(Facet {
                byte_start: link.start(),
                byte_end: link.end(),
                uri: format!("{JEP_URI_PREFIX}{}", number.as_str()),
            })
        })
        .collect()
}

/// Byte offset of the character at `char_idx`
///
/// An index past the end maps to `text.len()`.
pub fn char_to_byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets() {
        let facets = extract_facets("See openjdk.org/jeps/470\n");
        assert_eq!(
            facets,
            vec![Facet {
                byte_start: 4,
                byte_end: 24,
                uri: "https://openjdk.org/jeps/470".to_string(),
            }]
        );
    }

    #[test]
    fn test_offsets_after_emoji() {
        // U+1F3AF is four bytes, the following space one
        let text = "🎯 openjdk.org/jeps/12";
        let facets = extract_facets(text);
        assert_eq!(facets[0].byte_start, 5);
        assert_eq!(&text[facets[0].byte_start..facets[0].byte_end], "openjdk.org/jeps/12");
        assert_eq!(char_to_byte_offset(text, 2), 5);
    }

    #[test]
    fn test_multiple_links_in_order() {
        let text = "openjdk.org/jeps/1 and ✏️ openjdk.org/jeps/22";
        let facets = extract_facets(text);
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].uri, "https://openjdk.org/jeps/1");
        assert_eq!(facets[1].uri, "https://openjdk.org/jeps/22");
        assert!(facets[0].byte_end <= facets[1].byte_start);
    }

    #[test]
    fn test_no_links() {
        assert!(extract_facets("JEP 470 was drafted").is_empty());
        assert!(extract_facets("openjdk.org/jeps/").is_empty());
        assert!(extract_facets("").is_empty());
    }

    #[test]
    fn test_char_to_byte_offset_past_end() {
        assert_eq!(char_to_byte_offset("héllo", 2), 3);
        assert_eq!(char_to_byte_offset("héllo", 50), 6);
    }
}
