//! Access token caching

use std::future::Future;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds of validity a cached token must still have to be reused.
pub const EXPIRY_MARGIN_SECS: u64 = 60;

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Access token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: u64,
}

impl StoredToken {
    pub fn new(token: String, expires_in_secs: u64, now: u64) -> Self {
        Self {
            token,
            expires_at: now.saturating_add(expires_in_secs),
        }
    }

    /// True while more than [`EXPIRY_MARGIN_SECS`] of validity remain.
    pub fn is_fresh_at(&self, now: u64) -> bool {
        self.expires_at.saturating_sub(EXPIRY_MARGIN_SECS) > now
    }
}

/// Process-wide single-slot token cache.
///
/// The lock only guards reading or overwriting the slot; a refresh runs
/// without it. Two requests that both see a stale token may both refresh,
/// and the last one to finish wins.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<StoredToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if it is still fresh at `now`.
    pub fn fresh_at(&self, now: u64) -> Option<String> {
        let guard = self.slot.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|t| t.is_fresh_at(now))
            .map(|t| t.token.clone())
    }

    pub fn store(&self, token: StoredToken) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token);
    }

    /// Return the cached token if fresh at `now`, otherwise run `refresh`,
    /// cache its result, and return it. Refresh errors leave the slot as is.
    pub async fn get_or_refresh<F, Fut, E>(&self, now: u64, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredToken, E>>,
    {
        if let Some(token) = self.fresh_at(now) {
            return Ok(token);
        }

        let fresh = refresh().await?;
        let token = fresh.token.clone();
        self.store(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_stored_token_freshness_margin() {
        let token = StoredToken::new("t".to_string(), 3600, NOW);
        assert_eq!(token.expires_at, NOW + 3600);

        assert!(token.is_fresh_at(NOW));
        // 61 seconds left: still reusable.
        assert!(token.is_fresh_at(NOW + 3600 - 61));
        // Exactly 60 seconds left: refresh.
        assert!(!token.is_fresh_at(NOW + 3600 - 60));
        assert!(!token.is_fresh_at(NOW + 3600));
        assert!(!token.is_fresh_at(NOW + 7200));
    }

    #[test]
    fn test_short_lived_token_is_never_fresh() {
        let token = StoredToken::new("t".to_string(), 30, NOW);
        assert!(!token.is_fresh_at(NOW));
    }

    #[test]
    fn test_get_or_refresh_reuses_fresh_token() {
        let cache = TokenCache::new();
        cache.store(StoredToken::new("cached".to_string(), 3600, NOW));
        let calls = Cell::new(0);
        let counter = &calls;

        let token = tokio_test::block_on(cache.get_or_refresh(NOW + 100, move || async move {
            counter.set(counter.get() + 1);
            Ok::<_, String>(StoredToken::new("new".to_string(), 3600, NOW + 100))
        }))
        .unwrap();

        assert_eq!(token, "cached");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_get_or_refresh_refreshes_near_expiry() {
        let cache = TokenCache::new();
        cache.store(StoredToken::new("old".to_string(), 3600, NOW));
        let calls = Cell::new(0);
        let counter = &calls;
        let later = NOW + 3600 - 60;

        let token = tokio_test::block_on(cache.get_or_refresh(later, move || async move {
            counter.set(counter.get() + 1);
            Ok::<_, String>(StoredToken::new("new".to_string(), 3600, later))
        }))
        .unwrap();

        assert_eq!(token, "new");
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.fresh_at(later).as_deref(), Some("new"));
    }

    #[test]
    fn test_get_or_refresh_empty_cache() {
        let cache = TokenCache::new();
        let token = tokio_test::block_on(cache.get_or_refresh(NOW, || async {
            Ok::<_, String>(StoredToken::new("first".to_string(), 3600, NOW))
        }))
        .unwrap();
        assert_eq!(token, "first");
    }

    #[test]
    fn test_refresh_error_is_propagated_and_not_cached() {
        let cache = TokenCache::new();
        let err = tokio_test::block_on(cache.get_or_refresh(NOW, || async {
            Err::<StoredToken, _>("boom".to_string())
        }))
        .unwrap_err();

        assert_eq!(err, "boom");
        assert!(cache.fresh_at(NOW).is_none());
    }
}
