use super::{AllowedChains, Connector, ConnectorKind, ProviderSlot};
use crate::callbacks::{Callback, ConnectorCallbacks};
use crate::config::NetworkSettings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use web3sdk_error::Result;
use web3sdk_provider::{ChainProvider, JsonRpcProvider, Network, RpcClient};

/// Read-only connector over plain JSON-RPC endpoints.
///
/// Always available and never prompts anyone, so it is the fallback whenever
/// no wallet is connected. It never reports a connection change: a read-only
/// session is not "connected".
#[derive(Debug)]
pub struct NetworkConnector {
    chains: AllowedChains,
    client: Arc<RpcClient>,
    provider: ProviderSlot,
    callbacks: ConnectorCallbacks,
}

impl NetworkConnector {
    pub fn new(chains: &[NetworkSettings]) -> Result<Self> {
        let client = Arc::new(RpcClient::new()?);
        Self::with_client(chains, client)
    }

    /// Shares `client` with every provider this connector builds.
    pub fn with_client(chains: &[NetworkSettings], client: Arc<RpcClient>) -> Result<Self> {
        let chains = AllowedChains::new(ConnectorKind::Network, chains)?;
        let provider = Self::json_rpc(chains.first(), &client)?;
        Ok(Self {
            chains,
            client,
            provider: ProviderSlot::new(provider),
            callbacks: ConnectorCallbacks::new(),
        })
    }

    pub fn is_supported() -> bool {
        true
    }

    pub fn allowed_chains(&self) -> &AllowedChains {
        &self.chains
    }

    fn json_rpc(
        settings: &NetworkSettings,
        client: &Arc<RpcClient>,
    ) -> Result<Arc<dyn ChainProvider>> {
        let provider =
            JsonRpcProvider::with_client(&settings.rpc_url, settings.chain_id, client.clone())?;
        Ok(Arc::new(provider))
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Network
    }

    fn provider(&self) -> Arc<dyn ChainProvider> {
        self.provider.get()
    }

    fn callbacks(&self) -> &ConnectorCallbacks {
        &self.callbacks
    }

    fn set_connection_changed_callback(&self, _callback: Callback<bool>) {}

    async fn connect(&self, chain_id: Option<u64>) -> Result<Network> {
        self.callbacks.connection_changed.emit(true);

        match chain_id {
            Some(chain_id) => self.switch_chain(chain_id).await,
            None => self.get_network().await,
        }
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<Network> {
        let settings = self.chains.require(chain_id)?;
        let provider = Self::json_rpc(settings, &self.client)?;
        self.provider.replace(provider);
        debug!(chain_id, rpc_url = %settings.rpc_url, "Rebuilt JSON-RPC provider");

        let network = self.get_network().await?;
        info!(network = %network, "Read-only provider ready");
        Ok(network)
    }
}
