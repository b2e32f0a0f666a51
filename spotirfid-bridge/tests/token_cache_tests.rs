//! Token cache integration tests
//!
//! The OAuth endpoint is a wiremock server; request counts prove when the
//! cache was (or was not) consulted.

use futures::future::join_all;
use serde_json::json;
use spotirfid_bridge::spotify::{ClientCredentials, SpotifyClient};
use spotirfid_bridge::token_cache::{cache_key, TokenCache};
use spotirfid_bridge::BridgeError;
use spotirfid_common::db::init_memory_database;
use spotirfid_common::{time, ReaderConfig};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MARGIN: Duration = Duration::from_secs(60);

fn reader(refresh_token: &str) -> ReaderConfig {
    ReaderConfig {
        refresh_token: refresh_token.to_string(),
        target_device: "Office".to_string(),
        name: None,
    }
}

async fn setup() -> (MockServer, SqlitePool, TokenCache) {
    let server = MockServer::start().await;
    let pool = init_memory_database().await.unwrap();
    let spotify = SpotifyClient::with_client(reqwest::Client::new(), &server.uri(), &server.uri());
    let cache = TokenCache::new(
        pool.clone(),
        spotify,
        Arc::new(ClientCredentials::new("cid", "secret")),
        MARGIN,
    );
    (server, pool, cache)
}

fn token_grant(access_token: &str, expires_in: Option<u64>) -> ResponseTemplate {
    let mut body = json!({"access_token": access_token, "token_type": "Bearer"});
    if let Some(secs) = expires_in {
        body["expires_in"] = json!(secs);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

async fn token_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path() == "/api/token")
        .count()
}

async fn expire_cached_token(pool: &SqlitePool, reader_id: &str) {
    sqlx::query("UPDATE kv_entries SET expires_at = ? WHERE namespace = 'token_cache' AND key = ?")
        .bind(time::unix_now() - 1)
        .bind(cache_key(reader_id))
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_sends_client_credentials_and_refresh_token() {
    let (server, _pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", "Basic Y2lkOnNlY3JldA=="))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-r1"))
        .respond_with(token_grant("access-1", Some(3600)))
        .expect(1)
        .mount(&server)
        .await;

    let token = cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    assert_eq!(token, "access-1");
}

#[tokio::test]
async fn test_cached_token_skips_upstream() {
    let (server, _pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_grant("access-1", Some(3600)))
        .mount(&server)
        .await;

    let first = cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    let second = cache.access_token("r1", &reader("refresh-r1")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn test_expired_token_refreshes_exactly_once() {
    let (server, pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_grant("access-1", Some(3600)))
        .mount(&server)
        .await;

    cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    expire_cached_token(&pool, "r1").await;

    cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    cache.access_token("r1", &reader("refresh-r1")).await.unwrap();

    assert_eq!(token_requests(&server).await, 2);
}

#[tokio::test]
async fn test_ttl_is_expiry_minus_margin() {
    let (server, pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_grant("access-1", None))
        .mount(&server)
        .await;

    let before = time::unix_now();
    cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    let after = time::unix_now();

    // Absent expires_in defaults to 3600s
    let expires_at: i64 = sqlx::query_scalar("SELECT expires_at FROM kv_entries WHERE key = ?")
        .bind(cache_key("r1"))
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(expires_at >= before + 3540);
    assert!(expires_at <= after + 3540);
}

#[tokio::test]
async fn test_short_lifetime_is_not_cached() {
    let (server, pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_grant("short-lived", Some(60)))
        .mount(&server)
        .await;

    let token = cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    assert_eq!(token, "short-lived");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);

    cache.access_token("r1", &reader("refresh-r1")).await.unwrap();
    assert_eq!(token_requests(&server).await, 2);
}

#[tokio::test]
async fn test_refresh_failure_carries_status_text() {
    let (server, pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let result = cache.access_token("r1", &reader("revoked")).await;
    match result {
        Err(BridgeError::TokenRefreshFailed(text)) => assert_eq!(text, "Bad Request"),
        other => panic!("expected TokenRefreshFailed, got {other:?}"),
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_refresh() {
    let (server, _pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_grant("access-1", Some(3600)).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let config = reader("refresh-r1");
    let tokens = join_all((0..8).map(|_| cache.access_token("r1", &config))).await;

    for token in tokens {
        assert_eq!(token.unwrap(), "access-1");
    }
    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn test_readers_refresh_independently() {
    let (server, _pool, cache) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("refresh_token=refresh-r1"))
        .respond_with(token_grant("access-r1", Some(3600)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("refresh_token=refresh-r2"))
        .respond_with(token_grant("access-r2", Some(3600)))
        .expect(1)
        .mount(&server)
        .await;

    let r1 = reader("refresh-r1");
    let r2 = reader("refresh-r2");
    let (a, b) = tokio::join!(cache.access_token("r1", &r1), cache.access_token("r2", &r2));

    assert_eq!(a.unwrap(), "access-r1");
    assert_eq!(b.unwrap(), "access-r2");
}
