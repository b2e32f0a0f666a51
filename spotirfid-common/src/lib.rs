//! # SpotiRFID Common Library
//!
//! Shared code for the SpotiRFID bridge:
//! - Error type
//! - Configuration loading (TOML file, environment, compiled defaults)
//! - Key-value storage on SQLite with TTL support
//! - Reader directory (reader id → stored credentials)
//! - Tag mapping store ((reader, tag) → content reference)

pub mod config;
pub mod db;
pub mod error;
pub mod readers;
pub mod tags;
pub mod time;

pub use error::{Error, Result};
pub use readers::{ReaderConfig, ReaderDirectory};
pub use tags::TagMappingStore;
