use super::{AllowedChains, Connector, ConnectorKind, ProviderSlot};
use crate::callbacks::ConnectorCallbacks;
use crate::config::NetworkSettings;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use web3sdk_error::{ConnectError, Result};
use web3sdk_provider::{
    ChainProvider, JsonRpcProvider, Network, RelayOptions, RelayPairing, RelaySession,
    RpcClient, WalletEnvironment, WalletEvent, Web3Provider,
};

/// Connector for a wallet reached through a relay pairing service
/// (WalletConnect style).
///
/// A relay session is pinned to one chain, so switching chains tears the
/// session down and opens a new one. Until a session exists the provider is
/// a read-only endpoint for the first allowed chain.
pub struct RelayConnector {
    chains: AllowedChains,
    pairing: Arc<dyn RelayPairing>,
    client: Arc<RpcClient>,
    provider: ProviderSlot,
    session: Mutex<Option<Arc<dyn RelaySession>>>,
    // Bumped on every teardown; listeners of older sessions go quiet.
    epoch: Arc<AtomicU64>,
    callbacks: Arc<ConnectorCallbacks>,
}

impl RelayConnector {
    pub fn new(chains: &[NetworkSettings], env: &dyn WalletEnvironment) -> Result<Self> {
        let client = Arc::new(RpcClient::new()?);
        Self::with_client(chains, env, client)
    }

    pub fn with_client(
        chains: &[NetworkSettings],
        env: &dyn WalletEnvironment,
        client: Arc<RpcClient>,
    ) -> Result<Self> {
        let chains = AllowedChains::new(ConnectorKind::Relay, chains)?;
        let pairing = env
            .relay_pairing()
            .ok_or_else(|| ConnectError::CapabilityUnavailable {
                connector: ConnectorKind::Relay.name().to_string(),
                reason: "no relay pairing service configured".to_string(),
            })?;
        let provider = Self::read_only(chains.first(), &client)?;

        Ok(Self {
            chains,
            pairing,
            client,
            provider: ProviderSlot::new(provider),
            session: Mutex::new(None),
            epoch: Arc::new(AtomicU64::new(0)),
            callbacks: Arc::new(ConnectorCallbacks::new()),
        })
    }

    pub fn is_supported(env: &dyn WalletEnvironment) -> bool {
        env.relay_pairing().is_some()
    }

    pub fn allowed_chains(&self) -> &AllowedChains {
        &self.chains
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    fn read_only(
        settings: &NetworkSettings,
        client: &Arc<RpcClient>,
    ) -> Result<Arc<dyn ChainProvider>> {
        Ok(Arc::new(JsonRpcProvider::with_client(
            &settings.rpc_url,
            settings.chain_id,
            client.clone(),
        )?))
    }

    fn listen(&self, session: &Arc<dyn RelaySession>) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let current = self.epoch.clone();
        let callbacks = self.callbacks.clone();
        session.wallet().subscribe(Arc::new(move |event: WalletEvent| {
            if current.load(Ordering::SeqCst) != epoch {
                return;
            }
            match event {
                WalletEvent::AccountsChanged(accounts) => {
                    if let Some(account) = accounts.into_iter().next() {
                        callbacks.account_changed.emit(account);
                    }
                }
                WalletEvent::ChainChanged(chain_id) => callbacks
                    .network_changed
                    .emit(Network::from_chain_id(chain_id)),
                WalletEvent::Disconnected => callbacks.connection_changed.emit(false),
            }
        }));
    }

    /// Ends the current session, if any, and falls back to read-only.
    async fn teardown(&self) {
        let session = self.session.lock().await.take();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(session) = session {
            if let Err(e) = session.disconnect().await {
                warn!(error = %e, "Relay session teardown failed");
            }
            debug!("Relay session closed");
        }

        match Self::read_only(self.chains.first(), &self.client) {
            Ok(provider) => self.provider.replace(provider),
            Err(e) => warn!(error = %e, "Could not restore read-only provider"),
        }
    }

    async fn open_session(&self, chain_id: u64) -> Result<Network> {
        let options = RelayOptions {
            rpc: self.chains.rpc_map(),
            chain_id,
        };
        let session = self.pairing.open(options).await.map_err(|e| {
            ConnectError::PermissionDenied {
                connector: self.name().to_string(),
                reason: e.to_string(),
            }
        })?;
        self.provider
            .replace(Arc::new(Web3Provider::new(session.wallet())));
        *self.session.lock().await = Some(session.clone());

        let accounts = match session.enable().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.teardown().await;
                return Err(ConnectError::PermissionDenied {
                    connector: self.name().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            self.teardown().await;
            return Err(ConnectError::EmptyAccounts {
                connector: self.name().to_string(),
            });
        };
        self.callbacks.account_changed.emit(account);
        self.listen(&session);

        let network = match self.get_network().await {
            Ok(network) => network,
            Err(e) => {
                self.teardown().await;
                return Err(e);
            }
        };
        if self.chains.find(network.chain_id).is_none() {
            self.teardown().await;
            return Err(ConnectError::UnsupportedChain {
                connector: self.name().to_string(),
                chain_id: network.chain_id,
            });
        }

        self.callbacks.connection_changed.emit(true);
        info!(network = %network, "Relay session established");
        Ok(network)
    }
}

impl fmt::Debug for RelayConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConnector")
            .field("chains", &self.chains.chain_ids())
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for RelayConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Relay
    }

    fn provider(&self) -> Arc<dyn ChainProvider> {
        self.provider.get()
    }

    fn callbacks(&self) -> &ConnectorCallbacks {
        &self.callbacks
    }

    async fn connect(&self, chain_id: Option<u64>) -> Result<Network> {
        let target = match chain_id {
            Some(chain_id) => self.chains.require(chain_id)?.chain_id,
            None => self.chains.first().chain_id,
        };
        if self.has_session().await {
            self.teardown().await;
        }
        self.open_session(target).await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<Network> {
        self.chains.require(chain_id)?;
        self.teardown().await;
        self.open_session(chain_id).await
    }

    async fn disconnect(&self) -> Result<()> {
        self.teardown().await;
        Ok(())
    }
}
