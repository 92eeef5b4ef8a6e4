//! Supported network configuration

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;
use url::Url;
use web3sdk_error::{ConnectError, ErrorContext, Result};

fn default_decimals() -> u8 {
    18
}

/// Native currency of a chain, as wallets expect it in `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: default_decimals(),
        }
    }
}

/// Static description of one supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_image_template: Option<String>,
}

impl NetworkSettings {
    /// Minimal settings with no explorer, icons or token images.
    pub fn new(
        chain_id: u64,
        chain_name: impl Into<String>,
        native_currency: NativeCurrency,
        rpc_url: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            chain_name: chain_name.into(),
            native_currency,
            rpc_url: rpc_url.into(),
            block_explorer_urls: None,
            icon_urls: None,
            token_image_template: None,
        }
    }

    /// Logo URL for `token`, substituted into `tokenImageTemplate`.
    pub fn token_image_url(&self, token: &str) -> Option<String> {
        self.token_image_template
            .as_ref()
            .map(|template| template.replace("{}", token))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNetworksConfig {
    supported_networks: Vec<NetworkSettings>,
    default_chain_id: u64,
}

/// Ordered set of supported networks plus the default chain.
///
/// Always holds at least one network, no duplicate chain ids, a default chain
/// that is a member, and parseable RPC URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworksConfig {
    supported_networks: Vec<NetworkSettings>,
    default_chain_id: u64,
}

impl NetworksConfig {
    pub fn new(supported_networks: Vec<NetworkSettings>, default_chain_id: u64) -> Result<Self> {
        if supported_networks.is_empty() {
            return Err(ConnectError::NoChainsConfigured {
                context: "NetworksConfig".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(supported_networks.len());
        for network in &supported_networks {
            if !seen.insert(network.chain_id) {
                return Err(ConnectError::DuplicateChainId(network.chain_id));
            }
            Url::parse(&network.rpc_url).map_err(|e| ConnectError::InvalidRpcUrl {
                url: network.rpc_url.clone(),
                reason: e.to_string(),
            })?;
        }

        if !seen.contains(&default_chain_id) {
            return Err(ConnectError::DefaultChainMissing(default_chain_id));
        }

        Ok(Self {
            supported_networks,
            default_chain_id,
        })
    }

    /// Single-network config, defaulting to that network.
    pub fn single(network: NetworkSettings) -> Result<Self> {
        let chain_id = network.chain_id;
        Self::new(vec![network], chain_id)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawNetworksConfig = serde_json::from_str(json)?;
        Self::new(raw.supported_networks, raw.default_chain_id)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read networks config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn supported_networks(&self) -> &[NetworkSettings] {
        &self.supported_networks
    }

    pub fn default_chain_id(&self) -> u64 {
        self.default_chain_id
    }

    pub fn find(&self, chain_id: u64) -> Option<&NetworkSettings> {
        self.supported_networks
            .iter()
            .find(|network| network.chain_id == chain_id)
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.find(chain_id).is_some()
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.supported_networks.iter().map(|n| n.chain_id).collect()
    }

    /// First supported network. The fallback for the desired chain.
    pub fn first(&self) -> &NetworkSettings {
        // Non-empty by construction.
        &self.supported_networks[0]
    }
}

impl<'de> Deserialize<'de> for NetworksConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawNetworksConfig::deserialize(deserializer)?;
        Self::new(raw.supported_networks, raw.default_chain_id).map_err(de::Error::custom)
    }
}

/// A networks config together with the settings of the desired network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentNetwork {
    pub config: NetworksConfig,
    pub current: NetworkSettings,
}

impl CurrentNetwork {
    pub fn resolve(config: &NetworksConfig, desired_chain_id: u64) -> Result<Self> {
        let current = config
            .find(desired_chain_id)
            .cloned()
            .ok_or(ConnectError::UnsupportedNetwork(desired_chain_id))?;
        Ok(Self {
            config: config.clone(),
            current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3sdk_error::ErrorCategory;

    fn settings(chain_id: u64) -> NetworkSettings {
        NetworkSettings::new(
            chain_id,
            format!("chain {chain_id}"),
            NativeCurrency::new("Ether", "ETH"),
            format!("https://rpc.example/{chain_id}"),
        )
    }

    #[test]
    fn test_valid_config() {
        let config = NetworksConfig::new(vec![settings(1), settings(137)], 1).unwrap();
        assert_eq!(config.chain_ids(), vec![1, 137]);
        assert_eq!(config.first().chain_id, 1);
        assert!(config.contains(137));
        assert!(!config.contains(56));
    }

    #[test]
    fn test_empty_config_is_configuration_error() {
        let err = NetworksConfig::new(vec![], 1).unwrap_err();
        assert!(matches!(err, ConnectError::NoChainsConfigured { .. }));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_duplicate_chain_id() {
        let err = NetworksConfig::new(vec![settings(1), settings(1)], 1).unwrap_err();
        assert!(matches!(err, ConnectError::DuplicateChainId(1)));
    }

    #[test]
    fn test_default_must_be_supported() {
        let err = NetworksConfig::new(vec![settings(1)], 137).unwrap_err();
        assert!(matches!(err, ConnectError::DefaultChainMissing(137)));
    }

    #[test]
    fn test_invalid_rpc_url() {
        let mut bad = settings(1);
        bad.rpc_url = "not a url".to_string();
        let err = NetworksConfig::new(vec![bad], 1).unwrap_err();
        assert!(matches!(err, ConnectError::InvalidRpcUrl { .. }));
    }

    #[test]
    fn test_json_uses_camel_case_and_default_decimals() {
        let json = r#"{
            "supportedNetworks": [{
                "chainId": 137,
                "chainName": "Polygon",
                "nativeCurrency": { "name": "Matic", "symbol": "MATIC" },
                "rpcUrl": "https://polygon-rpc.com/",
                "tokenImageTemplate": "https://img.example/{}/logo.png"
            }],
            "defaultChainId": 137
        }"#;
        let config = NetworksConfig::from_json_str(json).unwrap();
        let polygon = config.find(137).unwrap();
        assert_eq!(polygon.native_currency.decimals, 18);
        assert_eq!(
            polygon.token_image_url("0xabc").as_deref(),
            Some("https://img.example/0xabc/logo.png")
        );

        let written = config.to_json_pretty().unwrap();
        assert!(written.contains("\"supportedNetworks\""));
        assert!(written.contains("\"chainId\": 137"));
    }

    #[test]
    fn test_json_runs_validation() {
        let json = r#"{ "supportedNetworks": [], "defaultChainId": 1 }"#;
        assert!(matches!(
            NetworksConfig::from_json_str(json),
            Err(ConnectError::NoChainsConfigured { .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("networks.json");
        let config = NetworksConfig::new(vec![settings(1), settings(56)], 56).unwrap();
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        let loaded = NetworksConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);

        let missing = NetworksConfig::from_json_file(dir.path().join("missing.json"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_current_network() {
        let config = NetworksConfig::new(vec![settings(1), settings(137)], 1).unwrap();
        let current = CurrentNetwork::resolve(&config, 137).unwrap();
        assert_eq!(current.current.chain_id, 137);
        assert!(matches!(
            CurrentNetwork::resolve(&config, 56),
            Err(ConnectError::UnsupportedNetwork(56))
        ));
    }
}
