//! Notification channels for publishing updates
//!
//! A channel takes a rendered [`Notification`] and delivers it to a feed.
//! Delivery failures are reported through [`DeliveryStatus`] rather than
//! as errors, so a caller can keep going with the next update.

pub mod bluesky;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notifications::Notification;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Why a channel could not deliver
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("request to the feed service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("channel misconfigured: {0}")]
    InvalidConfig(String),

    /// Session could not be established
    #[error("login rejected: {0}")]
    AuthFailed(String),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl ChannelError {
    /// Whether a later attempt can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::AuthFailed(_) => true,
            Self::Rejected { status, .. } => *status == 401 || *status == 429 || *status >= 500,
            Self::InvalidConfig(_) | Self::Other(_) => false,
        }
    }
}

/// Outcome of one post attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub delivered: bool,
    pub channel: String,
    /// Short note for logs, the failure reason when not delivered
    pub detail: Option<String>,
    /// Not delivered, but the next cycle may get through
    pub retryable: bool,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    fn new(delivered: bool, channel: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            delivered,
            channel: channel.into(),
            detail,
            retryable: false,
            attempted_at: chrono::Utc::now(),
        }
    }

    pub fn delivered(channel: impl Into<String>) -> Self {
        Self::new(true, channel, None)
    }

    pub fn delivered_with(channel: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(true, channel, Some(detail.into()))
    }

    /// Undelivered because of `error`
    pub fn failed(channel: impl Into<String>, error: &ChannelError) -> Self {
        Self {
            retryable: error.is_recoverable(),
            ..Self::new(false, channel, Some(error.to_string()))
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.delivered { "posted" } else { "not posted" };
        write!(f, "{} {outcome}", self.channel)?;
        match &self.detail {
            Some(detail) => write!(f, " ({detail})"),
            None => Ok(()),
        }
    }
}

/// A feed that announcements are published to
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Post one notification
    ///
    /// Failures the feed reports come back as an undelivered status; `Err` is
    /// kept for problems on this side of the wire.
    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus>;

    /// Settings worth logging, without secrets
    fn config(&self) -> serde_json::Value {
        serde_json::json!({ "channel": self.name() })
    }
}
