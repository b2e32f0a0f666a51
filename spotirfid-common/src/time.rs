//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as unix epoch seconds
pub fn unix_now() -> i64 {
    now().timestamp()
}

/// Unix epoch second at which an entry written now with `ttl` expires
///
/// Sub-second TTL components are rounded up so a 1.5s TTL never expires
/// earlier than requested.
pub fn expires_at(ttl: Duration) -> i64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    unix_now().saturating_add(i64::try_from(secs).unwrap_or(i64::MAX))
}
