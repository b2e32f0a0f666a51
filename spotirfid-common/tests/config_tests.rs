//! Configuration file loading tests
//!
//! Covers:
//! - Explicit config files (valid, missing, malformed, unknown keys)
//! - Graceful degradation when the default config file is absent
//!
//! Tests that change HOME / XDG_CONFIG_HOME are marked #[serial] so they do
//! not race each other.

use serial_test::serial;
use spotirfid_common::config::{default_config_path, TomlConfig};
use spotirfid_common::Error;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
client_id = "cid"
client_secret = "secret"
bind = "0.0.0.0:9000"
database = "/var/lib/spotirfid/bridge.db"
routes = "scan"
accounts_url = "http://localhost:1234"
api_url = "http://localhost:5678"
token_safety_margin_secs = 30
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.client_id.as_deref(), Some("cid"));
    assert_eq!(config.client_secret.as_deref(), Some("secret"));
    assert_eq!(config.bind.as_deref(), Some("0.0.0.0:9000"));
    assert_eq!(
        config.database,
        Some(PathBuf::from("/var/lib/spotirfid/bridge.db"))
    );
    assert_eq!(config.routes.as_deref(), Some("scan"));
    assert_eq!(config.token_safety_margin_secs, Some(30));
}

#[test]
fn test_load_partial_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "client_id = \"cid\"\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.client_id.as_deref(), Some("cid"));
    assert!(config.client_secret.is_none());
    assert!(config.bind.is_none());
}

#[test]
fn test_load_missing_explicit_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = TomlConfig::load(&temp_dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "client_id = [unterminated").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_unknown_key_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "clientid = \"typo\"\n").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_missing_default_file_is_not_error() {
    let temp_dir = TempDir::new().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let result = TomlConfig::load_default();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert!(result.unwrap().is_none());
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_file_is_picked_up() {
    let temp_dir = TempDir::new().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let path = default_config_path().unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "routes = \"album\"\n").unwrap();

    let result = TomlConfig::load_default();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    let config = result.unwrap().unwrap();
    assert_eq!(config.routes.as_deref(), Some("album"));
}
