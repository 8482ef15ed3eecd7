//! Configuration management for jepwatch
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the JEP index
pub const DEFAULT_SOURCE_URL: &str = "https://openjdk.org/jeps/0";

/// Default Bluesky PDS entry point
pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JEP index source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Bluesky account configuration
    #[serde(default)]
    pub bluesky: BlueskyConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Periodic run configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how the JEP index is fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the JEP index page
    pub url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum retry attempts on 429/5xx/timeouts
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
            user_agent: format!("jepwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SourceConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Bluesky account and posting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    /// PDS base URL
    pub service_url: String,

    /// Account handle, also used as the record repo
    pub handle: String,

    /// App password
    pub app_password: String,

    /// Language tag attached to each post
    pub language: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// How long a session token is reused before logging in again
    pub token_ttl_hours: i64,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            handle: String::new(),
            app_password: String::new(),
            language: String::from("en"),
            request_timeout_secs: 30,
            token_ttl_hours: 24,
        }
    }
}

impl BlueskyConfig {
    /// Whether credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.handle.trim().is_empty() && !self.app_password.is_empty()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session token lifetime
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/jeps.db"),
        }
    }
}

/// Periodic run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two cycles
    pub interval_secs: u64,

    /// Run a cycle immediately instead of waiting for the first tick
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            run_on_startup: true,
        }
    }
}

impl SchedulerConfig {
    /// Time between cycles, never below one second
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("JEPWATCH_SOURCE_URL") {
            config.source.url = url;
        }
        if let Some(timeout) = env_parse::<u64>("JEPWATCH_REQUEST_TIMEOUT")? {
            config.source.request_timeout_secs = timeout;
            config.bluesky.request_timeout_secs = timeout;
        }
        if let Some(retries) = env_parse::<u32>("JEPWATCH_MAX_RETRIES")? {
            config.source.max_retries = retries;
        }
        if let Ok(user_agent) = std::env::var("JEPWATCH_USER_AGENT") {
            config.source.user_agent = user_agent;
        }

        if let Ok(service_url) = std::env::var("BLUESKY_SERVICE_URL") {
            config.bluesky.service_url = service_url;
        }
        if let Ok(handle) = std::env::var("BLUESKY_HANDLE") {
            config.bluesky.handle = handle;
        }
        if let Ok(password) = std::env::var("BLUESKY_APP_PASSWORD") {
            config.bluesky.app_password = password;
        }
        if let Ok(language) = std::env::var("JEPWATCH_LANGUAGE") {
            config.bluesky.language = language;
        }

        if let Ok(path) = std::env::var("JEPWATCH_SQLITE_PATH") {
            config.database.sqlite_path = PathBuf::from(path);
        }

        if let Some(interval) = env_parse::<u64>("JEPWATCH_INTERVAL_SECS")? {
            config.scheduler.interval_secs = interval;
        }

        if let Ok(level) = std::env::var("JEPWATCH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("JEPWATCH_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_http_url("source.url", &self.source.url)?;
        validate_http_url("bluesky.service_url", &self.bluesky.service_url)?;

        if self.source.request_timeout_secs == 0 {
            anyhow::bail!("source.request_timeout_secs must be greater than 0");
        }

        if self.bluesky.request_timeout_secs == 0 {
            anyhow::bail!("bluesky.request_timeout_secs must be greater than 0");
        }

        if self.bluesky.token_ttl_hours <= 0 {
            anyhow::bail!("bluesky.token_ttl_hours must be positive");
        }

        if self.scheduler.interval_secs == 0 {
            anyhow::bail!("scheduler.interval_secs must be greater than 0");
        }

        Ok(())
    }

    /// Validation for commands that post to Bluesky
    pub fn validate_for_posting(&self) -> Result<()> {
        self.validate()?;
        if !self.bluesky.has_credentials() {
            anyhow::bail!("bluesky.handle and bluesky.app_password must be set to post updates");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            bluesky: BlueskyConfig::default(),
            database: DatabaseConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {key}: {value}")),
        Err(_) => Ok(None),
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).with_context(|| format!("{field} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{field} must start with http:// or https://");
    }
    Ok(())
}
