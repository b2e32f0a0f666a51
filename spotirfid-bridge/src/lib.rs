//! spotirfid-bridge library
//!
//! Turns RFID tag scans into Spotify playback. A scan from a known reader
//! either plays the content mapped to the tag, or (in write mode) maps the
//! tag to the album currently playing.

pub mod api;
pub mod devices;
pub mod error;
pub mod flow;
pub mod playback;
pub mod provision;
pub mod settings;
pub mod spotify;
pub mod token_cache;

pub use crate::error::{BridgeError, BridgeResult};

use axum::Router;
use chrono::{DateTime, Utc};
use settings::RouteMode;
use spotify::{ClientCredentials, SpotifyClient};
use spotirfid_common::{ReaderDirectory, TagMappingStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use token_cache::TokenCache;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Reader id → stored credentials and target device
    pub readers: ReaderDirectory,
    /// (reader, tag) → content reference
    pub tags: TagMappingStore,
    /// Access tokens, refreshed single-flight per reader
    pub tokens: Arc<TokenCache>,
    /// Spotify accounts service and Web API
    pub spotify: SpotifyClient,
    /// Endpoints mounted by [`build_router`]
    pub routes: RouteMode,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        spotify: SpotifyClient,
        credentials: ClientCredentials,
        token_safety_margin: Duration,
        routes: RouteMode,
    ) -> Self {
        let tokens = TokenCache::new(
            db.clone(),
            spotify.clone(),
            Arc::new(credentials),
            token_safety_margin,
        );

        Self {
            readers: ReaderDirectory::new(db.clone()),
            tags: TagMappingStore::new(db),
            tokens: Arc::new(tokens),
            spotify,
            routes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Which flow endpoints exist depends on [`AppState::routes`]; the health
/// endpoint is always mounted.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    let mut router = Router::new();

    if state.routes.serves_scan() {
        router = router.route(
            "/api/scan",
            post(api::scan).fallback(api::method_not_allowed),
        );
    }

    if state.routes.serves_album() {
        router = router
            .route(
                "/api/play-album",
                post(api::play_album).fallback(api::method_not_allowed),
            )
            .route(
                "/api/current-album",
                post(api::current_album).fallback(api::method_not_allowed),
            );
    }

    router
        .merge(api::health_routes())
        .fallback(api::unmatched)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
