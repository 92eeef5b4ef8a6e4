//! Built-in settings for well-known chains.
//!
//! Only the RPC endpoint is left to the application:
//!
//! ```
//! use web3sdk_connect::presets::{network_settings, CoreNetwork};
//!
//! let mainnet = network_settings(CoreNetwork::Mainnet, "https://cloudflare-eth.com/");
//! assert_eq!(mainnet.chain_id, 1);
//! assert_eq!(mainnet.native_currency.symbol, "ETH");
//! ```

use crate::config::{NativeCurrency, NetworkSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use web3sdk_error::ConnectError;

const TRUSTWALLET_ASSETS: &str = "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains";

pub fn eth_currency() -> NativeCurrency {
    NativeCurrency::new("Ether", "ETH")
}

pub fn matic_currency() -> NativeCurrency {
    NativeCurrency::new("Matic", "MATIC")
}

pub fn bnb_currency() -> NativeCurrency {
    NativeCurrency::new("Binance Coin", "BNB")
}

/// Chains with built-in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreNetwork {
    Mainnet,
    Ropsten,
    Matic,
    Mumbai,
    Bsc,
}

impl CoreNetwork {
    pub const ALL: [CoreNetwork; 5] = [
        CoreNetwork::Mainnet,
        CoreNetwork::Ropsten,
        CoreNetwork::Matic,
        CoreNetwork::Mumbai,
        CoreNetwork::Bsc,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            CoreNetwork::Mainnet => 1,
            CoreNetwork::Ropsten => 3,
            CoreNetwork::Matic => 137,
            CoreNetwork::Mumbai => 80001,
            CoreNetwork::Bsc => 56,
        }
    }

    pub fn chain_name(self) -> &'static str {
        match self {
            CoreNetwork::Mainnet => "Ethereum",
            CoreNetwork::Ropsten => "Ropsten (Testnet)",
            CoreNetwork::Matic => "Polygon",
            CoreNetwork::Mumbai => "Mumbai",
            CoreNetwork::Bsc => "Binance Smart Chain",
        }
    }

    pub fn native_currency(self) -> NativeCurrency {
        match self {
            CoreNetwork::Mainnet | CoreNetwork::Ropsten => eth_currency(),
            CoreNetwork::Matic | CoreNetwork::Mumbai => matic_currency(),
            CoreNetwork::Bsc => bnb_currency(),
        }
    }

    pub fn block_explorer_url(self) -> &'static str {
        match self {
            CoreNetwork::Mainnet => "https://etherscan.io/",
            CoreNetwork::Ropsten => "https://ropsten.etherscan.io/",
            CoreNetwork::Matic => "https://polygonscan.com/",
            CoreNetwork::Mumbai => "https://mumbai.polygonscan.com/",
            CoreNetwork::Bsc => "https://bscscan.com/",
        }
    }

    fn asset_chain(self) -> &'static str {
        match self {
            CoreNetwork::Mainnet | CoreNetwork::Ropsten => "ethereum",
            CoreNetwork::Matic | CoreNetwork::Mumbai => "polygon",
            CoreNetwork::Bsc => "smartchain",
        }
    }

    pub fn token_image_template(self) -> String {
        format!("{TRUSTWALLET_ASSETS}/{}/assets/{{}}/logo.png", self.asset_chain())
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for CoreNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreNetwork::Mainnet => "mainnet",
            CoreNetwork::Ropsten => "ropsten",
            CoreNetwork::Matic => "matic",
            CoreNetwork::Mumbai => "mumbai",
            CoreNetwork::Bsc => "bsc",
        };
        f.write_str(name)
    }
}

impl FromStr for CoreNetwork {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConnectError::Config(format!("unknown core network '{s}'")))
    }
}

/// Full settings for `network`, served from `rpc_url`.
pub fn network_settings(network: CoreNetwork, rpc_url: impl Into<String>) -> NetworkSettings {
    NetworkSettings {
        chain_id: network.chain_id(),
        chain_name: network.chain_name().to_string(),
        native_currency: network.native_currency(),
        rpc_url: rpc_url.into(),
        block_explorer_urls: Some(vec![network.block_explorer_url().to_string()]),
        icon_urls: None,
        token_image_template: Some(network.token_image_template()),
    }
}
