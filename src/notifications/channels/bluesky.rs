//! Bluesky posting channel
//!
//! Posts are created through the AT Protocol XRPC endpoints of the account's
//! PDS. A session token is obtained with `com.atproto.server.createSession`
//! and reused until it expires, then each post is a
//! `com.atproto.repo.createRecord` call carrying an `app.bsky.feed.post`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::BlueskyConfig;
use crate::notifications::facets::{extract_facets, Facet};
use crate::notifications::session::SessionCache;
use crate::notifications::Notification;

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

/// Collection and record type of a feed post
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Facet feature type for hyperlinks
pub const LINK_FEATURE_TYPE: &str = "app.bsky.richtext.facet#link";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: String,
}

/// Body of a `createRecord` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub repo: String,
    pub collection: String,
    pub record: PostRecord,
}

/// An `app.bsky.feed.post` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    pub created_at: String,
    pub langs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<RichTextFacet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextFacet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetFeature {
    #[serde(rename = "$type")]
    pub feature_type: String,
    pub uri: String,
}

impl From<Facet> for RichTextFacet {
    fn from(facet: Facet) -> Self {
        Self {
            index: ByteSlice {
                byte_start: facet.byte_start,
                byte_end: facet.byte_end,
            },
            features: vec![FacetFeature {
                feature_type: LINK_FEATURE_TYPE.to_string(),
                uri: facet.uri,
            }],
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// Bluesky notification channel
///
/// # Example
///
/// ```rust,ignore
/// use jepwatch::config::BlueskyConfig;
/// use jepwatch::notifications::channels::bluesky::BlueskyChannel;
///
/// let channel = BlueskyChannel::new(BlueskyConfig {
///     handle: "jeps.example.com".into(),
///     app_password: "xxxx-xxxx-xxxx-xxxx".into(),
///     ..Default::default()
/// })?;
///
/// let posted = channel.post_update("✏️ JEP 1 was drafted\n").await;
/// ```
pub struct BlueskyChannel {
    config: BlueskyConfig,
    client: Client,
    session: SessionCache,
}

impl BlueskyChannel {
    /// Create a new channel, validating the account settings
    pub fn new(config: BlueskyConfig) -> ChannelResult<Self> {
        validate(&config).map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        let session = SessionCache::new(config.token_ttl());

        Ok(Self {
            config,
            client,
            session,
        })
    }

    /// Account handle used as the record repo
    pub fn handle(&self) -> &str {
        &self.config.handle
    }

    /// Token cache of this channel
    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    /// Post `text`, returning whether the feed accepted it
    ///
    /// Failures are logged and never propagated.
    pub async fn post_update(&self, text: &str) -> bool {
        match self.publish(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to post update to Bluesky");
                false
            }
        }
    }

    /// Build the `createRecord` body for `text`
    pub fn build_request(&self, text: &str) -> CreateRecordRequest {
        let facets = extract_facets(text)
            .into_iter()
            .map(RichTextFacet::from)
            .collect();

        CreateRecordRequest {
            repo: self.config.handle.clone(),
            collection: POST_COLLECTION.to_string(),
            record: PostRecord {
                record_type: POST_COLLECTION.to_string(),
                text: text.to_string(),
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                langs: vec![self.config.language.clone()],
                facets,
            },
        }
    }

    /// Log in if needed, then create the post record
    pub async fn publish(&self, text: &str) -> ChannelResult<()> {
        let token = self.access_token().await?;
        let request = self.build_request(text);

        let response = self
            .client
            .post(self.endpoint(CREATE_RECORD))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                handle = %self.config.handle,
                facets = request.record.facets.len(),
                "Posted update to Bluesky"
            );
            return Ok(());
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Bluesky rejected the session token, logging in again next time");
            self.session.invalidate();
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Cached token, or a fresh one from `createSession`
    async fn access_token(&self) -> ChannelResult<String> {
        let now = Utc::now();
        if let Some(token) = self.session.valid_token(now) {
            tracing::debug!("Reusing cached Bluesky session");
            return Ok(token);
        }

        let token = self.login().await?;
        let session = self.session.store(token.clone(), now);
        tracing::debug!(expiry = %session.expiry, "Stored new Bluesky session");
        Ok(token)
    }

    async fn login(&self) -> ChannelResult<String> {
        tracing::info!(handle = %self.config.handle, "Logging in to Bluesky");

        let response = self
            .client
            .post(self.endpoint(CREATE_SESSION))
            .json(&CreateSessionRequest {
                identifier: &self.config.handle,
                password: &self.config.app_password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(ChannelError::AuthFailed(format!("HTTP {status}: {body}")));
        }

        let session: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::AuthFailed(format!("Unexpected session response: {e}")))?;

        Ok(session.access_jwt)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/xrpc/{method}",
            self.config.service_url.trim_end_matches('/')
        )
    }
}

fn validate(config: &BlueskyConfig) -> Result<(), String> {
    if !config.service_url.starts_with("http://") && !config.service_url.starts_with("https://") {
        return Err("Bluesky service URL must start with http:// or https://".to_string());
    }

    if !config.has_credentials() {
        return Err("Bluesky handle and app password are required".to_string());
    }

    if config.request_timeout_secs == 0 {
        return Err("Timeout must be greater than 0".to_string());
    }

    if config.token_ttl_hours <= 0 {
        return Err("Token TTL must be positive".to_string());
    }

    Ok(())
}

#[async_trait]
impl Channel for BlueskyChannel {
    fn name(&self) -> &str {
        "bluesky"
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus> {
        match self.publish(&notification.text).await {
            Ok(()) => Ok(DeliveryStatus::delivered_with(
                "bluesky",
                format!("Posted JEP {}", notification.display_number()),
            )),
            Err(e) => {
                tracing::error!(
                    number = %notification.display_number(),
                    error = %e,
                    retryable = e.is_recoverable(),
                    "Failed to post update to Bluesky"
                );
                Ok(DeliveryStatus::failed("bluesky", &e))
            }
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "service_url": self.config.service_url,
            "handle": self.config.handle,
            "language": self.config.language,
            "token_ttl_hours": self.config.token_ttl_hours,
        })
    }
}
