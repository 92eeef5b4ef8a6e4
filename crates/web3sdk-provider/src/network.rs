//! Network descriptor and chain id encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use web3sdk_error::{ConnectError, Result};

/// The network a provider reports it is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Chain id
    pub chain_id: u64,
    /// Well-known short name, or `"unknown"`
    pub name: String,
}

impl Network {
    /// Builds a descriptor for `chain_id`, naming well-known chains.
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "mainnet",
            3 => "ropsten",
            5 => "goerli",
            10 => "optimism",
            56 => "bsc",
            137 => "matic",
            8453 => "base",
            42161 => "arbitrum",
            80001 => "mumbai",
            11155111 => "sepolia",
            _ => "unknown",
        };
        Self {
            chain_id,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Encodes a chain id the way wallets expect it: `0x`-prefixed lowercase hex.
pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

/// Decodes a chain id from a hex string, decimal string, or JSON number.
pub fn parse_chain_id(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ConnectError::Format(format!("chain id {n} is not a u64"))),
        Value::String(s) => {
            let trimmed = s.trim();
            let parsed = match trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
            {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => trimmed.parse::<u64>(),
            };
            parsed.map_err(|e| ConnectError::Format(format!("chain id '{s}': {e}")))
        }
        other => Err(ConnectError::Format(format!(
            "chain id must be a string or number, got {other}"
        ))),
    }
}
