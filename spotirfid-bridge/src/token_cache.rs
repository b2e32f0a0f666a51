//! Access token cache
//!
//! Resolves a reader to a usable bearer token. A cached token is returned
//! without any upstream call; on a miss the reader's refresh token is
//! exchanged at the OAuth endpoint and the result cached for
//! `expires_in − safety_margin` seconds.
//!
//! Refreshes are single-flight per reader: concurrent misses for the same
//! reader wait on one exchange and then read its result from the cache.
//! Different readers never wait on each other.

use crate::error::{BridgeError, BridgeResult};
use crate::spotify::{status_text, ClientCredentials, SpotifyClient, TokenResponse};
use spotirfid_common::db::{KvStore, Namespace};
use spotirfid_common::ReaderConfig;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Cache key of a reader's access token
pub fn cache_key(reader_id: &str) -> String {
    format!("{reader_id}:access_token")
}

/// TTL to cache a token for, or `None` when it would not be positive
pub fn cache_ttl(expires_in_secs: u64, safety_margin: Duration) -> Option<Duration> {
    Duration::from_secs(expires_in_secs)
        .checked_sub(safety_margin)
        .filter(|ttl| !ttl.is_zero())
}

/// Per-reader refresh locks; an entry lives only while someone holds it
type RefreshLocks = std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>;

pub struct TokenCache {
    kv: KvStore,
    spotify: SpotifyClient,
    credentials: Arc<ClientCredentials>,
    safety_margin: Duration,
    refresh_locks: RefreshLocks,
}

/// A claim on a reader's refresh lock, released from the table on drop
///
/// Dropping also covers cancellation: a request abandoned while waiting or
/// refreshing still gives its table entry back.
struct RefreshSlot<'a> {
    locks: &'a RefreshLocks,
    reader_id: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> RefreshSlot<'a> {
    fn claim(locks: &'a RefreshLocks, reader_id: &'a str) -> Self {
        let mut table = locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(table.entry(reader_id.to_string()).or_default());
        Self {
            locks,
            reader_id,
            lock,
        }
    }

    async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for RefreshSlot<'_> {
    fn drop(&mut self) {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(std::mem::take(&mut self.lock));
        // Only the table's own reference left: nobody holds or awaits it
        if table
            .get(self.reader_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            table.remove(self.reader_id);
        }
    }
}

impl TokenCache {
    pub fn new(
        pool: SqlitePool,
        spotify: SpotifyClient,
        credentials: Arc<ClientCredentials>,
        safety_margin: Duration,
    ) -> Self {
        Self {
            kv: KvStore::new(pool, Namespace::TokenCache),
            spotify,
            credentials,
            safety_margin,
            refresh_locks: RefreshLocks::default(),
        }
    }

    /// Return a valid access token for the reader
    pub async fn access_token(
        &self,
        reader_id: &str,
        reader: &ReaderConfig,
    ) -> BridgeResult<String> {
        let key = cache_key(reader_id);
        if let Some(token) = self.kv.get(&key).await? {
            debug!(reader_id, "access token cache hit");
            return Ok(token);
        }

        let slot = RefreshSlot::claim(&self.refresh_locks, reader_id);
        let _guard = slot.acquire().await;

        // Another request may have refreshed while this one waited
        if let Some(token) = self.kv.get(&key).await? {
            debug!(reader_id, "access token refreshed by concurrent request");
            return Ok(token);
        }

        self.refresh(reader_id, reader).await
    }

    /// Exchange the reader's refresh token for a new access token
    async fn refresh(&self, reader_id: &str, reader: &ReaderConfig) -> BridgeResult<String> {
        info!(reader_id, "refreshing access token");

        let response = self
            .spotify
            .http()
            .post(self.spotify.token_url())
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", reader.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(reader_id, status = status.as_u16(), "token refresh rejected");
            return Err(BridgeError::TokenRefreshFailed(status_text(status)));
        }

        let grant: TokenResponse = response.json().await?;
        // A zero lifetime is treated like an absent one
        let expires_in = grant
            .expires_in
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        match cache_ttl(expires_in, self.safety_margin) {
            Some(ttl) => {
                self.kv
                    .put_with_ttl(&cache_key(reader_id), &grant.access_token, ttl)
                    .await?;
                debug!(reader_id, ttl_secs = ttl.as_secs(), "access token cached");
            }
            None => {
                warn!(
                    reader_id,
                    expires_in, "token lifetime within safety margin, not caching"
                );
            }
        }

        Ok(grant.access_token)
    }
}
