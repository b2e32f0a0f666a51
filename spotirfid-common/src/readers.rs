//! Reader directory
//!
//! Maps a reader id to the credentials and playback target stored for it.
//! Records are provisioned out-of-band; the request path only reads them.
//! An unknown reader is rejected here, before any upstream call is made.

use crate::db::{KvStore, Namespace};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Per-reader configuration record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderConfig {
    /// Long-lived OAuth refresh token for the reader's account
    pub refresh_token: String,
    /// Display name of the device playback is sent to
    pub target_device: String,
    /// Optional human label, e.g. "Bedroom Pi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ReaderConfig {
    fn is_complete(&self) -> bool {
        !self.refresh_token.is_empty() && !self.target_device.is_empty()
    }
}

/// Read access to reader records, plus provisioning helpers
#[derive(Clone)]
pub struct ReaderDirectory {
    kv: KvStore,
}

impl ReaderDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            kv: KvStore::new(pool, Namespace::ReaderConfig),
        }
    }

    /// Look up a reader by exact id
    ///
    /// Absent, unparseable and incomplete records all resolve to `None`.
    pub async fn resolve(&self, reader_id: &str) -> Result<Option<ReaderConfig>> {
        let Some(raw) = self.kv.get(reader_id).await? else {
            debug!(reader_id, "no config stored for reader");
            return Ok(None);
        };

        match serde_json::from_str::<ReaderConfig>(&raw) {
            Ok(config) if config.is_complete() => Ok(Some(config)),
            Ok(_) => {
                warn!(reader_id, "reader config is missing required fields");
                Ok(None)
            }
            Err(e) => {
                warn!(reader_id, error = %e, "reader config is not valid JSON");
                Ok(None)
            }
        }
    }

    /// Store (or replace) a reader record
    pub async fn provision(&self, reader_id: &str, config: &ReaderConfig) -> Result<()> {
        if reader_id.is_empty() {
            return Err(Error::InvalidInput("reader id is required".to_string()));
        }
        if !config.is_complete() {
            return Err(Error::InvalidInput(
                "refresh token and target device are required".to_string(),
            ));
        }

        let json = serde_json::to_string(config)?;
        self.kv.put(reader_id, &json).await
    }

    /// Delete a reader record. Returns whether it existed.
    pub async fn remove(&self, reader_id: &str) -> Result<bool> {
        self.kv.delete(reader_id).await
    }
}
