//! HTTP fetcher for the JEP index page
//!
//! This module provides the document transport used once per cycle:
//! - Automatic retry with exponential backoff on 429, 5xx and timeouts
//! - Charset detection from the Content-Type header
//! - Optional URL override for testing with mock servers

use crate::config::SourceConfig;
use crate::utils::error::FetchError;
use encoding_rs::{Encoding, UTF_8};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    Client, Response,
};
use scraper::Html;
use std::time::Duration;

/// Fetcher for the JEP index
pub struct TableFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Page to fetch
    url: String,

    /// User agent sent with every request
    user_agent: String,

    /// Maximum number of retry attempts for failed requests
    max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    base_delay_ms: u64,
}

impl TableFetcher {
    /// Create a fetcher from the source configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let mut fetcher =
            Self::with_url(&config.url, config.max_retries, config.request_timeout())?;
        fetcher.user_agent = config.user_agent.clone();
        Ok(fetcher)
    }

    /// Create a fetcher for an arbitrary URL
    ///
    /// # Arguments
    ///
    /// * `url` - Page to fetch
    /// * `max_retries` - Maximum number of retry attempts
    /// * `timeout` - Request timeout duration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn with_url(url: &str, max_retries: u32, timeout: Duration) -> Result<Self, FetchError> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            user_agent: SourceConfig::default().user_agent,
            max_retries,
            base_delay_ms: 1000,
        })
    }

    /// Override the backoff base delay
    #[must_use]
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Page this fetcher reads
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the index page
    ///
    /// # Errors
    ///
    /// Returns various `FetchError` variants depending on the failure mode
    pub async fn fetch_document(&self) -> Result<Html, FetchError> {
        let body = self.fetch_text().await?;
        Ok(Html::parse_document(&body))
    }

    /// Fetch the index page as text
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MaxRetriesExceeded` (or `RateLimit`) once all
    /// retries fail, and the first non-retryable error otherwise
    pub async fn fetch_text(&self) -> Result<String, FetchError> {
        tracing::info!(url = %self.url, "Fetching JEP index");
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            // Apply exponential backoff for retries
            if attempt > 0 {
                let delay = self.base_delay_ms * 2_u64.pow(attempt - 1);
                tracing::debug!(attempt, delay_ms = delay, "Retrying JEP index fetch");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self
                .client
                .get(&self.url)
                .headers(self.build_headers())
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.decode_response(response).await;
                    } else if Self::should_retry(status.as_u16()) {
                        tracing::warn!(status = status.as_u16(), attempt, "Retryable HTTP status");
                        last_error = Some(if status.as_u16() == 429 {
                            FetchError::RateLimit
                        } else {
                            FetchError::ServerError(status.as_u16())
                        });
                    } else {
                        return Err(FetchError::ServerError(status.as_u16()));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "JEP index request failed");
                    if e.is_timeout() {
                        last_error = Some(FetchError::Timeout);
                    } else {
                        last_error = Some(FetchError::Http(e));
                    }
                }
            }
        }

        // All retries exhausted
        match last_error {
            Some(FetchError::RateLimit) => Err(FetchError::RateLimit),
            _ => Err(FetchError::MaxRetriesExceeded),
        }
    }

    /// Determine if a status code should trigger a retry
    ///
    /// Retry on 429, 500, 502, 503 and 504. Any other failure status is
    /// returned immediately.
    fn should_retry(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    async fn decode_response(&self, response: Response) -> Result<String, FetchError> {
        // Get Content-Type header and convert to owned String before consuming response
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;
        Ok(decode_bytes(&bytes, &content_type))
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(user_agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, user_agent);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        headers
    }
}

/// Decode a response body using the charset of its Content-Type
///
/// A byte order mark wins over the header. Unknown or missing charsets are
/// decoded as UTF-8, and malformed sequences become U+FFFD.
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = actual.name(), "Replaced malformed bytes while decoding");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}
