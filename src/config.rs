//! Server Configuration - environment with `.env` fallback
//!
//! | Variable | Default |
//! |----------|---------|
//! | `METHANE_PORT` (then `PORT`) | `3001` |
//! | `METHANE_HOST` | `0.0.0.0` |
//! | `METHANE_NETWORK` | `bitcoin` |
//! | `METHANE_MINT_DATA` | `2,1,77` |

use crate::mint::{MintData, Network};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("invalid network {0:?} (expected bitcoin|testnet|signet|regtest)")]
    InvalidNetwork(String),
    #[error("invalid mint data {0:?} (expected T,A,P)")]
    InvalidMintData(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub network: Network,
    pub mint_data: MintData,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.into(), port: DEFAULT_PORT, network: Network::default(), mint_data: MintData::default() }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = get("METHANE_PORT").or_else(|| get("PORT")) {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(host) = get("METHANE_HOST") {
            config.host = host;
        }
        if let Some(network) = get("METHANE_NETWORK") {
            config.network = network.parse().map_err(|_| ConfigError::InvalidNetwork(network))?;
        }
        if let Some(mint_data) = get("METHANE_MINT_DATA") {
            config.mint_data = mint_data.parse().map_err(|_| ConfigError::InvalidMintData(mint_data))?;
        }
        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self { self.port = port; self }
    pub fn with_host(mut self, host: impl Into<String>) -> Self { self.host = host.into(); self }
    pub fn with_network(mut self, network: Network) -> Self { self.network = network; self }

    pub fn addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Load `KEY=value` lines into the process environment. Existing vars win.
pub fn load_dotenv(path: impl AsRef<Path>) -> usize {
    let Ok(contents) = std::fs::read_to_string(path) else { return 0 };
    let mut loaded = 0;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var(&key).is_err() {
            std::env::set_var(&key, value);
            loaded += 1;
        }
    }
    loaded
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().trim_matches('"').to_string()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "0.0.0.0:3001");
    }

    #[test]
    fn test_port_precedence() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.port, 8080);
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080"), ("METHANE_PORT", "9000")])).unwrap();
        assert_eq!(config.port, 9000);
        let config = ServerConfig::from_lookup(lookup(&[("METHANE_PORT", " "), ("PORT", "8080")])).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[("METHANE_PORT", "http")])), Err(ConfigError::InvalidPort("http".into())));
        assert!(matches!(ServerConfig::from_lookup(lookup(&[("METHANE_NETWORK", "litecoin")])), Err(ConfigError::InvalidNetwork(_))));
        assert!(matches!(ServerConfig::from_lookup(lookup(&[("METHANE_MINT_DATA", "2,1")])), Err(ConfigError::InvalidMintData(_))));
    }

    #[test]
    fn test_network_and_mint_data() {
        let config = ServerConfig::from_lookup(lookup(&[("METHANE_NETWORK", "signet"), ("METHANE_MINT_DATA", "2,0,77")])).unwrap();
        assert_eq!(config.network, Network::Signet);
        assert_eq!(config.mint_data, MintData::new(2, 0, 77));
    }

    #[test]
    fn test_parse_dotenv() {
        let parsed = parse_dotenv("# comment\nMETHANE_PORT=4000\n\nMETHANE_HOST=\"127.0.0.1\"\nEMPTY=\nnot a pair\n");
        assert_eq!(parsed, vec![("METHANE_PORT".into(), "4000".into()), ("METHANE_HOST".into(), "127.0.0.1".into())]);
    }
}
