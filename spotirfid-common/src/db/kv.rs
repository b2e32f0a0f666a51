//! Namespaced key-value store with per-entry TTL
//!
//! Every durable map the bridge consumes (reader configs, tag mappings,
//! token cache) is a [`Namespace`] inside the `kv_entries` table. Expired
//! entries are invisible to reads immediately; [`KvStore::purge_expired`]
//! only reclaims space.

use crate::{time, Error, Result};
use sqlx::SqlitePool;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Logical map inside the shared `kv_entries` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// reader id → ReaderConfig JSON
    ReaderConfig,
    /// "{reader}:{tag}" → content reference
    TagMap,
    /// "{reader}:access_token" → bearer token
    TokenCache,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::ReaderConfig => "reader_config",
            Namespace::TagMap => "tag_map",
            Namespace::TokenCache => "token_cache",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle on one namespace of the key-value table
#[derive(Clone)]
pub struct KvStore {
    pool: SqlitePool,
    namespace: Namespace,
}

impl KvStore {
    pub fn new(pool: SqlitePool, namespace: Namespace) -> Self {
        Self { pool, namespace }
    }

    /// Read a live (unexpired) value
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM kv_entries
            WHERE namespace = ? AND key = ?
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(self.namespace.as_str())
        .bind(key)
        .bind(time::unix_now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Write a value with no expiry, replacing any previous value
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.upsert(key, value, None).await
    }

    /// Write a value that disappears once `ttl` has elapsed
    ///
    /// A zero TTL is rejected: the entry would be dead on arrival.
    pub async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(Error::InvalidInput(format!(
                "TTL for {}/{} must be positive",
                self.namespace, key
            )));
        }

        self.upsert(key, value, Some(time::expires_at(ttl))).await
    }

    /// Remove a key. Returns whether a row existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(self.namespace.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (namespace, key, value, expires_at, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(self.namespace.as_str())
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!(namespace = %self.namespace, key = key, ttl = expires_at.is_some(), "kv entry written");

        Ok(())
    }

    /// Delete expired rows from every namespace
    pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(time::unix_now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    async fn store(namespace: Namespace) -> (SqlitePool, KvStore) {
        let pool = init_memory_database().await.unwrap();
        let kv = KvStore::new(pool.clone(), namespace);
        (pool, kv)
    }

    async fn force_expiry(pool: &SqlitePool, key: &str) {
        sqlx::query("UPDATE kv_entries SET expires_at = ? WHERE key = ?")
            .bind(time::unix_now() - 1)
            .bind(key)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_pool, kv) = store(Namespace::TagMap).await;
        assert_eq!(kv.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_pool, kv) = store(Namespace::TagMap).await;
        kv.put("r1:t1", "spotify:album:A").await.unwrap();
        kv.put("r1:t1", "spotify:album:B").await.unwrap();
        assert_eq!(kv.get("r1:t1").await.unwrap().as_deref(), Some("spotify:album:B"));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let pool = init_memory_database().await.unwrap();
        let tags = KvStore::new(pool.clone(), Namespace::TagMap);
        let tokens = KvStore::new(pool, Namespace::TokenCache);

        tags.put("r1:access_token", "not-a-token").await.unwrap();
        assert_eq!(tokens.get("r1:access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_entry_visible_until_expiry() {
        let (pool, kv) = store(Namespace::TokenCache).await;
        kv.put_with_ttl("r1:access_token", "tok", Duration::from_secs(3540))
            .await
            .unwrap();
        assert_eq!(kv.get("r1:access_token").await.unwrap().as_deref(), Some("tok"));

        force_expiry(&pool, "r1:access_token").await;
        assert_eq!(kv.get("r1:access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (_pool, kv) = store(Namespace::TokenCache).await;
        let result = kv.put_with_ttl("r1:access_token", "tok", Duration::ZERO).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(kv.get("r1:access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_without_ttl_clears_previous_expiry() {
        let (pool, kv) = store(Namespace::TagMap).await;
        kv.put_with_ttl("k", "v1", Duration::from_secs(10)).await.unwrap();
        kv.put("k", "v2").await.unwrap();

        let expires_at: Option<i64> =
            sqlx::query_scalar("SELECT expires_at FROM kv_entries WHERE key = 'k'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(expires_at, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_pool, kv) = store(Namespace::ReaderConfig).await;
        kv.put("r1", "{}").await.unwrap();
        assert!(kv.delete("r1").await.unwrap());
        assert!(!kv.delete("r1").await.unwrap());
        assert_eq!(kv.get("r1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_expired_only_removes_stale_rows() {
        let (pool, kv) = store(Namespace::TokenCache).await;
        kv.put_with_ttl("stale", "a", Duration::from_secs(60)).await.unwrap();
        kv.put_with_ttl("fresh", "b", Duration::from_secs(60)).await.unwrap();
        kv.put("forever", "c").await.unwrap();
        force_expiry(&pool, "stale").await;

        let purged = KvStore::purge_expired(&pool).await.unwrap();
        assert_eq!(purged, 1);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 2);
    }
}
