//! Config Tests: `.env` loading and process-environment precedence

use methane::config::{load_dotenv, ServerConfig};
use methane::Network;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

const KEYS: &[&str] = &["METHANE_PORT", "PORT", "METHANE_HOST", "METHANE_NETWORK", "METHANE_MINT_DATA"];

fn clear_env() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

/// Test: `.env` fills unset vars, existing vars win
#[test]
fn dotenv_does_not_override_existing() {
    let _guard = lock_env();
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(".env");
    std::fs::write(&path, "METHANE_PORT=4100\nMETHANE_NETWORK=\"signet\"\n# METHANE_HOST=ignored\nPORT=9999\n").unwrap();
    std::env::set_var("PORT", "5000");

    assert_eq!(load_dotenv(&path), 2);
    let config = ServerConfig::from_env().expect("config");
    assert_eq!(config.port, 4100);
    assert_eq!(config.network, Network::Signet);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(std::env::var("PORT").as_deref(), Ok("5000"));
    clear_env();
}

/// Test: missing `.env` is not an error
#[test]
fn missing_dotenv_loads_nothing() {
    let _guard = lock_env();
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    assert_eq!(load_dotenv(dir.path().join(".env")), 0);
    assert_eq!(ServerConfig::from_env().expect("config"), ServerConfig::default());
}
