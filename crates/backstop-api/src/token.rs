//! Bearer token cache

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, TimeDelta, Utc};

/// Tokens are refreshed this long before they actually expire.
pub const REFRESH_MARGIN_SECS: i64 = 30;

/// Longest lifetime accepted from a token response.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Holds the current access token and its expiry.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, unless it expires within the refresh margin of `now`.
    pub fn current(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|t| now < t.expires_at - Duration::seconds(REFRESH_MARGIN_SECS))
            .map(|t| t.access_token.clone())
    }

    /// Cache `access_token` for `expires_in_secs`, clamped to
    /// `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn store(&self, access_token: String, expires_in_secs: i64, now: DateTime<Utc>) {
        let lifetime = expires_in_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at = TimeDelta::try_seconds(lifetime)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(CachedToken {
            access_token,
            expires_at,
        });
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
