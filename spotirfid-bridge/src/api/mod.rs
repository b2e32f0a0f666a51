//! HTTP API handlers for spotirfid-bridge
//!
//! All flow endpoints take JSON over POST. Any other method answers 405
//! (except GET /health); a POST to an unknown path answers 404.

pub mod album;
pub mod fallback;
pub mod health;
pub mod scan;
pub mod types;

pub use album::{current_album, play_album};
pub use fallback::{method_not_allowed, unmatched};
pub use health::health_routes;
pub use scan::scan;

use crate::error::BridgeError;
use tracing::{error, info, warn};

/// Log a failed request at a level matching its severity
pub(crate) fn report_failure(endpoint: &str, reader_id: &str, err: &BridgeError) {
    match err {
        e if e.is_business_failure() => info!(endpoint, reader_id, "request declined: {}", e),
        BridgeError::MalformedRequestBody(_) => warn!(endpoint, "rejected request: {}", err),
        _ => error!(endpoint, reader_id, "request failed: {}", err),
    }
}
