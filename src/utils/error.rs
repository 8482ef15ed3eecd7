//! Error types for the jepwatch pipeline stages
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while fetching the index document
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the next cycle can succeed without intervention
    ///
    /// Retries only run out on 429, 5xx and transport failures. A 4xx
    /// returned straight away means the URL itself is wrong.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RateLimit | Self::Timeout | Self::MaxRetriesExceeded => true,
            Self::ServerError(status) => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Reasons a single table row does not produce an entry
///
/// These never abort a parse; the offending row is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Structural or header row
    #[error("Row has {0} cells, expected at least 5")]
    TooFewCells(usize),

    /// First cell is not a known type code
    #[error("Unknown JEP type code: {0:?}")]
    UnknownKind(String),

    /// Second cell is not a known state code
    #[error("Unknown JEP state code: {0:?}")]
    UnknownState(String),
}

impl RowError {
    /// Rows that are expected to be skipped on every page load
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::TooFewCells(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_structural() {
        assert!(RowError::TooFewCells(3).is_structural());
        assert!(!RowError::UnknownKind("X".into()).is_structural());
        assert!(!RowError::UnknownState("XXX".into()).is_structural());
    }

    #[test]
    fn test_fetch_error_recoverable() {
        assert!(FetchError::Timeout.is_recoverable());
        assert!(FetchError::ServerError(503).is_recoverable());
        assert!(!FetchError::ServerError(404).is_recoverable());
        assert!(FetchError::MaxRetriesExceeded.is_recoverable());
        assert!(!FetchError::InvalidUrl("jeps".into()).is_recoverable());
    }

    #[test]
    fn test_row_error_messages() {
        assert_eq!(
            RowError::UnknownKind("X".into()).to_string(),
            "Unknown JEP type code: \"X\""
        );
        assert_eq!(
            RowError::TooFewCells(2).to_string(),
            "Row has 2 cells, expected at least 5"
        );
    }
}
