//! Tag mapping store: (reader, tag) → content reference
//!
//! Last write wins. Mappings are never deleted by the request path.

use crate::db::{KvStore, Namespace};
use crate::Result;
use sqlx::SqlitePool;

/// Composite key under which a tag's mapping is stored
pub fn mapping_key(reader_id: &str, tag_id: &str) -> String {
    format!("{reader_id}:{tag_id}")
}

#[derive(Clone)]
pub struct TagMappingStore {
    kv: KvStore,
}

impl TagMappingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            kv: KvStore::new(pool, Namespace::TagMap),
        }
    }

    pub async fn get(&self, reader_id: &str, tag_id: &str) -> Result<Option<String>> {
        self.kv.get(&mapping_key(reader_id, tag_id)).await
    }

    pub async fn put(&self, reader_id: &str, tag_id: &str, content_ref: &str) -> Result<()> {
        self.kv.put(&mapping_key(reader_id, tag_id), content_ref).await
    }
}
