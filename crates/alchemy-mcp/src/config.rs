//! Startup configuration from the environment

use std::fmt;

use alchemy_client::Network;
use thiserror::Error;
use tracing::warn;

pub const API_KEY_VAR: &str = "ALCHEMY_API_KEY";
pub const NETWORK_VAR: &str = "ALCHEMY_NETWORK";
pub const EVENT_BUFFER_VAR: &str = "ALCHEMY_MCP_EVENT_BUFFER";

/// Default capacity of the subscription event channel
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{API_KEY_VAR} is not set")]
    MissingApiKey,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub api_key: String,
    pub network: Network,
    pub event_buffer: usize,
}

impl ServerConfig {
    /// Read the process environment once
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let network = Network::parse_or_default(lookup(NETWORK_VAR).as_deref());

        Ok(Self {
            api_key,
            network,
            event_buffer: event_buffer(&lookup),
        })
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"<redacted>")
            .field("network", &self.network)
            .field("event_buffer", &self.event_buffer)
            .finish()
    }
}

/// Event channel capacity, never below one
pub fn event_buffer(lookup: impl Fn(&str) -> Option<String>) -> usize {
    match lookup(EVENT_BUFFER_VAR) {
        None => DEFAULT_EVENT_BUFFER,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(
                    value = %raw,
                    "Invalid {}, using {}", EVENT_BUFFER_VAR, DEFAULT_EVENT_BUFFER
                );
                DEFAULT_EVENT_BUFFER
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            ServerConfig::from_lookup(env(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            ServerConfig::from_lookup(env(&[(API_KEY_VAR, "  ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(env(&[(API_KEY_VAR, "k")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.network, Network::EthMainnet);
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_network_and_buffer() {
        let config = ServerConfig::from_lookup(env(&[
            (API_KEY_VAR, "k"),
            (NETWORK_VAR, "base-sepolia"),
            (EVENT_BUFFER_VAR, "16"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::BaseSepolia);
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ServerConfig::from_lookup(env(&[
            (API_KEY_VAR, "k"),
            (NETWORK_VAR, "dogechain"),
            (EVENT_BUFFER_VAR, "0"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::EthMainnet);
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ServerConfig::from_lookup(env(&[(API_KEY_VAR, "secret-key")])).unwrap();
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
