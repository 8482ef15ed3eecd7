//! Crate-wide error type
//!
//! Each stage keeps its own error enum ([`FetchError`], [`ChannelError`],
//! and `anyhow` inside the repository); [`Error`] wraps them so the pipeline
//! can log one type and record in its [`CycleReport`] whether a failure
//! clears up on its own or needs someone to look at it.
//!
//! [`CycleReport`]: crate::crawler::CycleReport
//!
//! ```rust,ignore
//! use jepwatch::error::{Error, WatchErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "{}", err.user_message());
//!     } else {
//!         tracing::error!(category = %err.category(), error = %err, "needs attention");
//!     }
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

pub use crate::notifications::channels::ChannelError;
pub use crate::utils::error::{FetchError, RowError};

/// Shared queries over jepwatch errors
pub trait WatchErrorTrait: std::error::Error {
    /// A later cycle may succeed without intervention
    fn is_recoverable(&self) -> bool;

    /// Short description for the cycle report
    fn user_message(&self) -> String;

    /// Which part of the system failed
    fn category(&self) -> ErrorCategory;
}

/// Coarse grouping of failures by origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Fetching the index
    Network,
    /// Snapshot lookups and saves
    Storage,
    /// Posting and authentication
    Delivery,
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Delivery => "delivery",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure inside a watch cycle
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("posting failed: {0}")]
    Channel(#[from] ChannelError),

    /// Repository failure, with its context chain as the source
    #[error("storage: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl WatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Storage(_) => false,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Fetch(e) => format!("could not fetch the JEP index: {e}"),
            Self::Channel(e) => format!("could not post the update: {e}"),
            Self::Storage(e) => format!("could not use the snapshot database: {e:#}"),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::InvalidUrl(_)) => ErrorCategory::Config,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Channel(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Channel(_) => ErrorCategory::Delivery,
            Self::Storage(_) => ErrorCategory::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let bad_url = Error::Fetch(FetchError::InvalidUrl("nope".into()));
        assert_eq!(bad_url.category(), ErrorCategory::Config);

        let channel_err = Error::Channel(ChannelError::AuthFailed("bad password".into()));
        assert_eq!(channel_err.category(), ErrorCategory::Delivery);

        let storage_err: Error = anyhow::anyhow!("disk full").into();
        assert_eq!(storage_err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Fetch(FetchError::Timeout).is_recoverable());
        assert!(!Error::Fetch(FetchError::ServerError(404)).is_recoverable());

        let rejected = Error::Channel(ChannelError::Rejected {
            status: 503,
            body: String::new(),
        });
        assert!(rejected.is_recoverable());

        let storage_err: Error = anyhow::anyhow!("locked").into();
        assert!(!storage_err.is_recoverable());
    }

    #[test]
    fn test_storage_error_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "jeps.db missing");
        let err: Error = anyhow::Error::new(io)
            .context("Failed to open SQLite database")
            .into();

        assert!(err.to_string().contains("Failed to open SQLite database"));
        assert!(err.to_string().contains("jeps.db missing"));

        let chain: Vec<String> = std::iter::successors(err.source(), |&e| e.source())
            .map(|e| e.to_string())
            .collect();
        assert!(chain.iter().any(|m| m == "jeps.db missing"), "{chain:?}");
    }

    #[test]
    fn test_user_message() {
        let err = Error::Fetch(FetchError::MaxRetriesExceeded);
        assert_eq!(
            err.user_message(),
            "could not fetch the JEP index: Maximum retry attempts exceeded"
        );
        assert_eq!(ErrorCategory::Delivery.to_string(), "delivery");
    }
}
