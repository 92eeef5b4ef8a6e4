//! Configuration from the environment (and `.env`)

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use web3sdk::connect::{network_settings, CoreNetwork, FileStore, NetworksConfig};
use web3sdk::provider::{Throttle, TransportConfig};

pub const DEFAULT_MAINNET_RPC: &str = "https://cloudflare-eth.com/";
pub const DEFAULT_POLYGON_RPC: &str = "https://polygon-rpc.com/";

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// `WEB3SDK_NETWORKS`: JSON networks file replacing the defaults
    pub networks_path: Option<PathBuf>,
    /// `WEB3SDK_MAINNET_RPC`
    pub mainnet_rpc: Option<String>,
    /// `WEB3SDK_POLYGON_RPC`
    pub polygon_rpc: Option<String>,
    /// `WEB3SDK_PREFERENCES`: preferences file, default under the user config dir
    pub preferences_path: Option<PathBuf>,
    /// `WEB3SDK_RPC_TIMEOUT`: per-request timeout in seconds
    pub rpc_timeout: Option<String>,
    /// `WEB3SDK_RPC_RATE_LIMIT`: `rate` or `rate/burst` requests per second
    pub rpc_rate_limit: Option<String>,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            networks_path: var("WEB3SDK_NETWORKS").map(PathBuf::from),
            mainnet_rpc: var("WEB3SDK_MAINNET_RPC"),
            polygon_rpc: var("WEB3SDK_POLYGON_RPC"),
            preferences_path: var("WEB3SDK_PREFERENCES").map(PathBuf::from),
            rpc_timeout: var("WEB3SDK_RPC_TIMEOUT"),
            rpc_rate_limit: var("WEB3SDK_RPC_RATE_LIMIT"),
        }
    }

    pub fn transport(&self) -> anyhow::Result<TransportConfig> {
        let request_timeout = match &self.rpc_timeout {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("WEB3SDK_RPC_TIMEOUT={raw:?}"))?;
                anyhow::ensure!(secs > 0, "WEB3SDK_RPC_TIMEOUT must be at least 1 second");
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        let throttle = self
            .rpc_rate_limit
            .as_deref()
            .map(str::parse::<Throttle>)
            .transpose()
            .context("WEB3SDK_RPC_RATE_LIMIT")?;
        Ok(TransportConfig {
            request_timeout,
            throttle,
        })
    }

    pub fn load_networks(&self) -> anyhow::Result<NetworksConfig> {
        if let Some(path) = &self.networks_path {
            return NetworksConfig::from_json_file(path)
                .with_context(|| format!("loading networks from {}", path.display()));
        }
        let mainnet = self.mainnet_rpc.as_deref().unwrap_or(DEFAULT_MAINNET_RPC);
        let polygon = self.polygon_rpc.as_deref().unwrap_or(DEFAULT_POLYGON_RPC);
        let networks = NetworksConfig::new(
            vec![
                network_settings(CoreNetwork::Mainnet, mainnet),
                network_settings(CoreNetwork::Matic, polygon),
            ],
            CoreNetwork::Mainnet.chain_id(),
        )?;
        Ok(networks)
    }

    pub fn preference_store(&self) -> anyhow::Result<FileStore> {
        match &self.preferences_path {
            Some(path) => Ok(FileStore::new(path.clone())),
            None => FileStore::in_config_dir().context("locating the preferences file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_networks() {
        let networks = config(&[]).load_networks().unwrap();
        assert_eq!(networks.chain_ids(), vec![1, 137]);
        assert_eq!(networks.default_chain_id(), 1);
        assert_eq!(networks.find(1).unwrap().rpc_url, DEFAULT_MAINNET_RPC);
    }

    #[test]
    fn test_rpc_overrides_and_blank_vars() {
        let config = config(&[
            ("WEB3SDK_MAINNET_RPC", "http://localhost:8545/"),
            ("WEB3SDK_NETWORKS", "  "),
        ]);
        assert!(config.networks_path.is_none());
        let networks = config.load_networks().unwrap();
        assert_eq!(networks.find(1).unwrap().rpc_url, "http://localhost:8545/");
    }

    #[test]
    fn test_transport_defaults_to_unlimited() {
        assert_eq!(config(&[]).transport().unwrap(), TransportConfig::default());
    }

    #[test]
    fn test_transport_from_env() {
        let transport = config(&[
            ("WEB3SDK_RPC_TIMEOUT", "30"),
            ("WEB3SDK_RPC_RATE_LIMIT", "10/25"),
        ])
        .transport()
        .unwrap();
        assert_eq!(transport.request_timeout, Some(Duration::from_secs(30)));
        let throttle = transport.throttle.unwrap();
        assert_eq!((throttle.per_second.get(), throttle.burst.get()), (10, 25));

        assert!(config(&[("WEB3SDK_RPC_TIMEOUT", "0")]).transport().is_err());
        assert!(config(&[("WEB3SDK_RPC_TIMEOUT", "soon")]).transport().is_err());
        assert!(config(&[("WEB3SDK_RPC_RATE_LIMIT", "0")]).transport().is_err());
    }

    #[test]
    fn test_networks_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("networks.json");
        std::fs::write(
            &path,
            r#"{
                "supportedNetworks": [{
                    "chainId": 56,
                    "chainName": "BSC",
                    "nativeCurrency": { "name": "BNB", "symbol": "BNB", "decimals": 18 },
                    "rpcUrl": "https://bsc-dataseed.binance.org/"
                }],
                "defaultChainId": 56
            }"#,
        )
        .unwrap();

        let config = config(&[("WEB3SDK_NETWORKS", path.to_str().unwrap())]);
        let networks = config.load_networks().unwrap();
        assert_eq!(networks.chain_ids(), vec![56]);

        let missing = self::config(&[("WEB3SDK_NETWORKS", "/nonexistent/networks.json")]);
        assert!(missing.load_networks().is_err());
    }
}
