//! Cached Bluesky session token
//!
//! The cache holds at most one token. Reads and writes each take the lock
//! once and never hold it across an `.await`, so concurrent posters may
//! log in twice on a cold cache; the last stored token wins.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Default lifetime assumed for an access token
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// An access token and the instant it stops being reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl AuthSession {
    /// Session issued at `issued_at` and valid for `ttl`
    pub fn issued(token: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            expiry: issued_at + ttl,
        }
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

/// Single-slot token cache owned by a channel
#[derive(Debug)]
pub struct SessionCache {
    ttl: Duration,
    slot: Mutex<Option<AuthSession>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Token lifetime used by [`SessionCache::store`]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached token if it has not expired at `now`
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<String> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|session| session.is_valid_at(now))
            .map(|session| session.token.clone())
    }

    /// Replace the cached session with a token issued at `issued_at`
    pub fn store(&self, token: impl Into<String>, issued_at: DateTime<Utc>) -> AuthSession {
        let session = AuthSession::issued(token, issued_at, self.ttl);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(session.clone());
        session
    }

    /// Drop the cached session so the next post logs in again
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Snapshot of the current session, expired or not
    pub fn current(&self) -> Option<AuthSession> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_has_no_token() {
        let cache = SessionCache::default();
        assert_eq!(cache.valid_token(Utc::now()), None);
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let cache = SessionCache::default();
        let issued = Utc::now();
        let session = cache.store("jwt-1", issued);

        assert_eq!(session.expiry, issued + Duration::hours(24));
        assert_eq!(
            cache.valid_token(issued + Duration::hours(23)),
            Some("jwt-1".to_string())
        );
        assert_eq!(cache.valid_token(issued + Duration::hours(24)), None);
    }

    #[test]
    fn test_store_replaces_previous_token() {
        let cache = SessionCache::new(Duration::minutes(5));
        let now = Utc::now();
        cache.store("old", now);
        cache.store("new", now);
        assert_eq!(cache.valid_token(now), Some("new".to_string()));
    }

    #[test]
    fn test_invalidate() {
        let cache = SessionCache::default();
        let now = Utc::now();
        cache.store("jwt", now);
        cache.invalidate();
        assert!(cache.current().is_none());
        assert_eq!(cache.valid_token(now), None);
    }
}
