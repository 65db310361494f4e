//! Persisted cache of per-book download tokens.
//!
//! The cache is a single JSON object stored under
//! [`StorageKeys::DOWNLOAD_TOKENS`], mapping ebook id to `{ token, expiresAt }`.
//! It is re-read from storage on every operation. Unreadable or corrupt
//! contents behave as an empty cache.

use crate::error::ApiResult;
use crate::transport::ApiClient;
use crate::types::DownloadToken;
use chrono::{DateTime, Duration, Utc};
use folio_storage::{KeyValueStore, StorageKeys};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tokens this close to expiry are treated as already expired.
pub const EXPIRY_BUFFER_SECS: i64 = 30;

type TokenMap = BTreeMap<String, DownloadToken>;

/// True while `token` is still usable at `now`, leaving the expiry buffer.
pub fn is_still_valid(token: &DownloadToken, now: DateTime<Utc>) -> bool {
    token.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS) > now
}

pub struct DownloadTokenCache {
    storage: Arc<dyn KeyValueStore>,
    api: Arc<ApiClient>,
}

impl DownloadTokenCache {
    pub fn new(storage: Arc<dyn KeyValueStore>, api: Arc<ApiClient>) -> Self {
        Self { storage, api }
    }

    /// A usable download token for `ebook_id`.
    ///
    /// Returns the cached token when it is still valid. Otherwise requests a
    /// new one; that token is written to the cache only when `force_refresh`
    /// is false. A forced refresh always hits the network and never touches
    /// the cache.
    pub async fn ensure_token(&self, ebook_id: &str, force_refresh: bool) -> ApiResult<String> {
        if !force_refresh {
            if let Some(cached) = self.cached(ebook_id) {
                debug!(ebook_id = %ebook_id, "Download token cache hit");
                return Ok(cached.token);
            }
        }

        let issued = self.api.downloads().request_token(ebook_id).await?;
        debug!(
            ebook_id = %ebook_id,
            expires_at = %issued.expires_at,
            force_refresh,
            "Issued download token"
        );

        if !force_refresh {
            // Re-read so entries written while the request was in flight survive
            let mut tokens = self.read();
            tokens.insert(ebook_id.to_string(), issued.clone());
            self.write(&tokens);
        }

        Ok(issued.token)
    }

    /// The cached token for `ebook_id`, if present and still valid.
    pub fn cached(&self, ebook_id: &str) -> Option<DownloadToken> {
        let now = Utc::now();
        self.read()
            .remove(ebook_id)
            .filter(|token| is_still_valid(token, now))
    }

    /// Every persisted entry, valid or not.
    pub fn entries(&self) -> BTreeMap<String, DownloadToken> {
        self.read()
    }

    /// Drop the cached token for one book. No-op if there is none.
    pub fn invalidate(&self, ebook_id: &str) {
        let mut tokens = self.read();
        if tokens.remove(ebook_id).is_some() {
            self.write(&tokens);
            debug!(ebook_id = %ebook_id, "Download token invalidated");
        }
    }

    /// Remove the whole cache from storage.
    pub fn clear_all(&self) {
        match self.storage.delete(StorageKeys::DOWNLOAD_TOKENS) {
            Ok(true) => info!("Download token cache cleared"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to clear download token cache"),
        }
    }

    fn read(&self) -> TokenMap {
        let raw = match self.storage.get(StorageKeys::DOWNLOAD_TOKENS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TokenMap::new(),
            Err(e) => {
                warn!(error = %e, "Download token cache unavailable, treating as empty");
                return TokenMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Download token cache is corrupt, treating as empty");
            TokenMap::new()
        })
    }

    fn write(&self, tokens: &TokenMap) {
        let encoded = match serde_json::to_string(tokens) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode download token cache");
                return;
            }
        };
        if let Err(e) = self.storage.set(StorageKeys::DOWNLOAD_TOKENS, &encoded) {
            warn!(error = %e, "Failed to persist download token cache");
        }
    }
}

impl std::fmt::Debug for DownloadTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadTokenCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(seconds: i64) -> DownloadToken {
        DownloadToken {
            token: "dl".into(),
            expires_at: Utc::now() + Duration::seconds(seconds),
        }
    }

    #[test]
    fn test_validity_respects_buffer() {
        let now = Utc::now();
        let at = |offset: i64| DownloadToken {
            token: "dl".into(),
            expires_at: now + Duration::seconds(offset),
        };

        assert!(is_still_valid(&at(31), now));
        assert!(!is_still_valid(&at(30), now));
        assert!(!is_still_valid(&at(10), now));
        assert!(!is_still_valid(&at(-5), now));
    }

    #[test]
    fn test_cached_ignores_expiring_entries() {
        let stack = crate::testutil::TestStack::new();
        let mut tokens = TokenMap::new();
        tokens.insert("fresh".into(), token_expiring_in(600));
        tokens.insert("stale".into(), token_expiring_in(20));
        stack.tokens.write(&tokens);

        assert!(stack.tokens.cached("fresh").is_some());
        assert!(stack.tokens.cached("stale").is_none());
        assert!(stack.tokens.cached("missing").is_none());
        assert_eq!(stack.tokens.entries().len(), 2);
    }
}
