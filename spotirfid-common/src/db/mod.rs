//! Durable storage for SpotiRFID
//!
//! A single SQLite database holds every namespace (reader configs, tag
//! mappings, cached access tokens) as rows of one key-value table.

pub mod init;
pub mod kv;

pub use init::*;
pub use kv::{KvStore, Namespace};
