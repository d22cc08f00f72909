//! Supported Alchemy networks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Network selector used to build endpoint hostnames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    #[default]
    EthMainnet,
    EthSepolia,
    EthHolesky,
    PolygonMainnet,
    PolygonAmoy,
    ArbMainnet,
    ArbSepolia,
    OptMainnet,
    OptSepolia,
    BaseMainnet,
    BaseSepolia,
}

impl Network {
    /// Every supported network, in display order
    pub const ALL: [Network; 11] = [
        Network::EthMainnet,
        Network::EthSepolia,
        Network::EthHolesky,
        Network::PolygonMainnet,
        Network::PolygonAmoy,
        Network::ArbMainnet,
        Network::ArbSepolia,
        Network::OptMainnet,
        Network::OptSepolia,
        Network::BaseMainnet,
        Network::BaseSepolia,
    ];

    /// Hostname label, e.g. `eth-mainnet`
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::EthMainnet => "eth-mainnet",
            Network::EthSepolia => "eth-sepolia",
            Network::EthHolesky => "eth-holesky",
            Network::PolygonMainnet => "polygon-mainnet",
            Network::PolygonAmoy => "polygon-amoy",
            Network::ArbMainnet => "arb-mainnet",
            Network::ArbSepolia => "arb-sepolia",
            Network::OptMainnet => "opt-mainnet",
            Network::OptSepolia => "opt-sepolia",
            Network::BaseMainnet => "base-mainnet",
            Network::BaseSepolia => "base-sepolia",
        }
    }

    /// EIP-155 chain ID
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::EthMainnet => 1,
            Network::EthSepolia => 11155111,
            Network::EthHolesky => 17000,
            Network::PolygonMainnet => 137,
            Network::PolygonAmoy => 80002,
            Network::ArbMainnet => 42161,
            Network::ArbSepolia => 421614,
            Network::OptMainnet => 10,
            Network::OptSepolia => 11155420,
            Network::BaseMainnet => 8453,
            Network::BaseSepolia => 84532,
        }
    }

    /// Parse a selector, falling back to Ethereum mainnet when it is absent
    /// or not recognized.
    pub fn parse_or_default(selector: Option<&str>) -> Self {
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            None => Network::default(),
            Some(s) => s.parse().unwrap_or_else(|_| {
                warn!(
                    "Unrecognized network '{}', falling back to {}",
                    s,
                    Network::default()
                );
                Network::default()
            }),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Network::ALL
            .into_iter()
            .find(|n| n.as_str() == normalized)
            .ok_or_else(|| format!("unknown network: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_network() {
        assert_eq!("base-mainnet".parse::<Network>(), Ok(Network::BaseMainnet));
        assert_eq!("ETH_SEPOLIA".parse::<Network>(), Ok(Network::EthSepolia));
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        assert_eq!(Network::parse_or_default(None), Network::EthMainnet);
        assert_eq!(Network::parse_or_default(Some("")), Network::EthMainnet);
        assert_eq!(
            Network::parse_or_default(Some("dogecoin")),
            Network::EthMainnet
        );
        assert_eq!(
            Network::parse_or_default(Some(" polygon-amoy ")),
            Network::PolygonAmoy
        );
    }

    #[test]
    fn test_every_network_round_trips_through_its_label() {
        for network in Network::ALL {
            assert_eq!(network.as_str().parse::<Network>(), Ok(network));
        }
    }
}
