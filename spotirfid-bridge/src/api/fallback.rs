//! Plain-text fallbacks for unknown paths and unsupported methods
//!
//! The method is checked before the path: only a POST to an unknown path
//! is "Not found", any other method anywhere is "Method not allowed".

use axum::http::{Method, StatusCode};

/// Fallback for requests no route matches
pub async fn unmatched(method: Method) -> (StatusCode, &'static str) {
    if method == Method::POST {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        method_not_allowed().await
    }
}

/// Fallback for unsupported methods on mounted paths
pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
