//! Notification rendering and delivery
//!
//! # Architecture
//!
//! ```text
//!   Entry ──► format_update ──► Notification ──► Channel::send
//!                                   │
//!                                   └─► extract_facets (byte spans of links)
//! ```
//!
//! Rendering is pure. Delivery goes through a [`Channel`]; the only
//! implementation posts to Bluesky and keeps its own session token cache.

pub mod channels;
pub mod facets;
pub mod format;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::models::Entry;

// Re-exports
pub use channels::bluesky::BlueskyChannel;
pub use channels::{Channel, ChannelError, DeliveryStatus};
pub use facets::{extract_facets, Facet};
pub use format::format_update;
pub use session::{AuthSession, SessionCache};

/// A rendered update ready to be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// JEP number the text is about, for logging
    pub number: Option<String>,
    /// Post text
    pub text: String,
}

impl Notification {
    /// Render the update text for an entry
    pub fn for_entry(entry: &Entry) -> Self {
        Self {
            number: entry.number.clone(),
            text: format_update(entry),
        }
    }

    /// Number or `?`
    pub fn display_number(&self) -> &str {
        self.number.as_deref().unwrap_or("?")
    }

    /// Link facets of the text
    pub fn facets(&self) -> Vec<Facet> {
        extract_facets(&self.text)
    }
}
