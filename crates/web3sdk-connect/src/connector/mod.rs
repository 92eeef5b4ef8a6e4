//! Connectors: strategies for obtaining a chain provider.
//!
//! - [`NetworkConnector`]: read-only JSON-RPC, no user interaction
//! - [`InjectedConnector`]: browser extension wallet (`window.ethereum`)
//! - [`RelayConnector`]: wallet reached through a relay pairing service

mod injected;
mod network;
mod relay;

pub use injected::InjectedConnector;
pub use network::NetworkConnector;
pub use relay::RelayConnector;

use crate::callbacks::{Callback, ConnectorCallbacks};
use crate::config::NetworkSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use web3sdk_error::{ConnectError, Result};
use web3sdk_provider::{ChainProvider, Network};

/// The three connector variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    Network,
    Injected,
    Relay,
}

impl ConnectorKind {
    /// Name persisted in `connector-cache`. Kept compatible with the names
    /// the JavaScript SDK writes.
    pub fn name(self) -> &'static str {
        match self {
            ConnectorKind::Network => "NetworkConnector",
            ConnectorKind::Injected => "MetaMaskConnector",
            ConnectorKind::Relay => "WalletConnectConnector",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            ConnectorKind::Network,
            ConnectorKind::Injected,
            ConnectorKind::Relay,
        ]
        .into_iter()
        .find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability every connector exposes.
///
/// A connector owns exactly one provider at a time. `switch_chain` and
/// `connect` may replace it; callers should re-read [`Connector::provider`]
/// after either.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    fn kind(&self) -> ConnectorKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Current provider handle
    fn provider(&self) -> Arc<dyn ChainProvider>;

    fn callbacks(&self) -> &ConnectorCallbacks;

    fn set_connection_changed_callback(&self, callback: Callback<bool>) {
        self.callbacks().connection_changed.set(callback);
    }

    fn set_account_changed_callback(&self, callback: Callback<String>) {
        self.callbacks().account_changed.set(callback);
    }

    fn set_network_changed_callback(&self, callback: Callback<Network>) {
        self.callbacks().network_changed.set(callback);
    }

    /// Establishes the session, then switches to `chain_id` if given or
    /// reports the current network otherwise.
    async fn connect(&self, chain_id: Option<u64>) -> Result<Network>;

    /// Moves to `chain_id`, which must be one of the allowed chains.
    async fn switch_chain(&self, chain_id: u64) -> Result<Network>;

    /// Releases any wallet-held session.
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Network the provider reports. Any failure becomes
    /// [`ConnectError::ProviderUnreachable`].
    async fn get_network(&self) -> Result<Network> {
        self.provider()
            .get_network()
            .await
            .map_err(ConnectError::unreachable)
    }
}

/// Non-empty list of chains a connector may use.
#[derive(Debug, Clone)]
pub struct AllowedChains {
    kind: ConnectorKind,
    chains: Vec<NetworkSettings>,
}

impl AllowedChains {
    pub fn new(kind: ConnectorKind, chains: &[NetworkSettings]) -> Result<Self> {
        if chains.is_empty() {
            return Err(ConnectError::NoChainsConfigured {
                context: kind.name().to_string(),
            });
        }
        Ok(Self {
            kind,
            chains: chains.to_vec(),
        })
    }

    pub fn find(&self, chain_id: u64) -> Option<&NetworkSettings> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Settings for `chain_id`, or `ChainNotAllowed`.
    pub fn require(&self, chain_id: u64) -> Result<&NetworkSettings> {
        self.find(chain_id).ok_or_else(|| ConnectError::ChainNotAllowed {
            connector: self.kind.name().to_string(),
            chain_id,
        })
    }

    pub fn first(&self) -> &NetworkSettings {
        &self.chains[0]
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.chains.iter().map(|c| c.chain_id).collect()
    }

    /// RPC URL per chain id, as relay sessions expect it.
    pub fn rpc_map(&self) -> BTreeMap<u64, String> {
        self.chains
            .iter()
            .map(|c| (c.chain_id, c.rpc_url.clone()))
            .collect()
    }
}

/// The provider slot a connector owns.
struct ProviderSlot {
    inner: RwLock<Arc<dyn ChainProvider>>,
}

impl ProviderSlot {
    fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            inner: RwLock::new(provider),
        }
    }

    fn get(&self) -> Arc<dyn ChainProvider> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, provider: Arc<dyn ChainProvider>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = provider,
            Err(poisoned) => *poisoned.into_inner() = provider,
        }
    }
}

impl fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NativeCurrency;

    fn chains(ids: &[u64]) -> Vec<NetworkSettings> {
        ids.iter()
            .map(|&id| {
                NetworkSettings::new(
                    id,
                    format!("chain {id}"),
                    NativeCurrency::new("Ether", "ETH"),
                    format!("https://rpc.example/{id}"),
                )
            })
            .collect()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            ConnectorKind::Network,
            ConnectorKind::Injected,
            ConnectorKind::Relay,
        ] {
            assert_eq!(ConnectorKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ConnectorKind::from_name("Connector"), None);
    }

    #[test]
    fn test_allowed_chains() {
        let allowed = AllowedChains::new(ConnectorKind::Injected, &chains(&[1, 137])).unwrap();
        assert_eq!(allowed.first().chain_id, 1);
        assert_eq!(allowed.chain_ids(), vec![1, 137]);
        assert_eq!(allowed.rpc_map()[&137], "https://rpc.example/137");

        let err = allowed.require(56).unwrap_err();
        assert!(matches!(
            err,
            ConnectError::ChainNotAllowed { chain_id: 56, .. }
        ));
        assert!(err.to_string().contains("MetaMaskConnector"));
    }

    #[test]
    fn test_empty_allowed_chains() {
        let err = AllowedChains::new(ConnectorKind::Relay, &[]).unwrap_err();
        assert!(matches!(err, ConnectError::NoChainsConfigured { .. }));
    }
}
