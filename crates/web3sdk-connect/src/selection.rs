//! Picking the initial connector and desired chain from cached preferences.

use crate::config::NetworksConfig;
use crate::connector::{
    Connector, ConnectorKind, InjectedConnector, NetworkConnector, RelayConnector,
};
use std::sync::Arc;
use tracing::debug;
use web3sdk_error::Result;
use web3sdk_provider::{RpcClient, WalletEnvironment};

/// Builds a connector of `kind` over every supported network.
pub fn build_connector(
    kind: ConnectorKind,
    networks: &NetworksConfig,
    env: &dyn WalletEnvironment,
    client: Arc<RpcClient>,
) -> Result<Arc<dyn Connector>> {
    let chains = networks.supported_networks();
    Ok(match kind {
        ConnectorKind::Network => Arc::new(NetworkConnector::with_client(chains, client)?),
        ConnectorKind::Injected => Arc::new(InjectedConnector::new(chains, env)?),
        ConnectorKind::Relay => Arc::new(RelayConnector::with_client(chains, env, client)?),
    })
}

/// Connector kind to start with, given the cached connector name.
///
/// A cached wallet connector is only honoured when the environment still
/// supports it; everything else falls back to read-only.
pub fn select_connector_kind(cached: Option<&str>, env: &dyn WalletEnvironment) -> ConnectorKind {
    match cached.and_then(ConnectorKind::from_name) {
        Some(ConnectorKind::Injected) if InjectedConnector::is_supported(env) => {
            ConnectorKind::Injected
        }
        Some(ConnectorKind::Relay) if RelayConnector::is_supported(env) => ConnectorKind::Relay,
        _ => ConnectorKind::Network,
    }
}

pub fn select_connector(
    networks: &NetworksConfig,
    cached: Option<&str>,
    env: &dyn WalletEnvironment,
    client: Arc<RpcClient>,
) -> Result<Arc<dyn Connector>> {
    let kind = select_connector_kind(cached, env);
    debug!(cached = ?cached, selected = %kind, "Selected initial connector");
    build_connector(kind, networks, env, client)
}

/// The cached chain id if it is supported, otherwise the first supported
/// network.
pub fn resolve_desired_chain(networks: &NetworksConfig, cached: Option<u64>) -> u64 {
    cached
        .filter(|chain_id| networks.contains(*chain_id))
        .unwrap_or_else(|| networks.first().chain_id)
}
