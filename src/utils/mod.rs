//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

/// Truncate text to at most `max_chars` characters, appending `...` when cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(truncate_text("🎯🎯🎯🎯🎯", 4), "🎯...");
    }
}
