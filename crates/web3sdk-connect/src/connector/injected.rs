use super::{AllowedChains, Connector, ConnectorKind};
use crate::callbacks::ConnectorCallbacks;
use crate::config::NetworkSettings;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use web3sdk_error::{ConnectError, Result, UNRECOGNIZED_CHAIN};
use web3sdk_provider::{
    to_hex_chain_id, ChainProvider, ListenerId, Network, WalletEnvironment, WalletEvent,
    WalletProvider, Web3Provider,
};

/// Connector for a browser extension wallet such as MetaMask.
#[derive(Debug)]
pub struct InjectedConnector {
    chains: AllowedChains,
    provider: Arc<Web3Provider>,
    callbacks: Arc<ConnectorCallbacks>,
    listener: Mutex<Option<ListenerId>>,
}

impl InjectedConnector {
    /// Fails with a configuration error for an empty chain list, and with
    /// `CapabilityUnavailable` outside a browser or without an extension.
    pub fn new(chains: &[NetworkSettings], env: &dyn WalletEnvironment) -> Result<Self> {
        let chains = AllowedChains::new(ConnectorKind::Injected, chains)?;

        if !env.is_browser() {
            return Err(ConnectError::CapabilityUnavailable {
                connector: ConnectorKind::Injected.name().to_string(),
                reason: "window object not detected".to_string(),
            });
        }
        let wallet = env
            .injected_provider()
            .ok_or_else(|| ConnectError::CapabilityUnavailable {
                connector: ConnectorKind::Injected.name().to_string(),
                reason: "extension wallet not detected".to_string(),
            })?;

        Ok(Self {
            chains,
            provider: Arc::new(Web3Provider::new(wallet)),
            callbacks: Arc::new(ConnectorCallbacks::new()),
            listener: Mutex::new(None),
        })
    }

    pub fn is_supported(env: &dyn WalletEnvironment) -> bool {
        env.is_browser() && env.injected_provider().is_some()
    }

    pub fn allowed_chains(&self) -> &AllowedChains {
        &self.chains
    }

    fn wallet(&self) -> &Arc<dyn WalletProvider> {
        self.provider.wallet()
    }

    /// Registers the wallet listener unless one is already registered.
    fn listen(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        if listener.is_some() {
            return;
        }
        let callbacks = self.callbacks.clone();
        let id = self.wallet().subscribe(Arc::new(move |event: WalletEvent| match event {
            WalletEvent::AccountsChanged(accounts) => {
                callbacks.connection_changed.emit(!accounts.is_empty());
                if let Some(account) = accounts.into_iter().next() {
                    callbacks.account_changed.emit(account);
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                callbacks
                    .network_changed
                    .emit(Network::from_chain_id(chain_id));
            }
            WalletEvent::Disconnected => callbacks.connection_changed.emit(false),
        }));
        *listener = Some(id);
    }

    async fn request_switch(&self, chain_id: u64) -> Result<Value> {
        self.provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": to_hex_chain_id(chain_id) }]),
            )
            .await
    }

    async fn request_add(&self, settings: &NetworkSettings) -> Result<Value> {
        let mut params = Map::new();
        params.insert("chainId".into(), json!(to_hex_chain_id(settings.chain_id)));
        params.insert("chainName".into(), json!(settings.chain_name));
        params.insert("nativeCurrency".into(), json!(settings.native_currency));
        params.insert("rpcUrls".into(), json!([settings.rpc_url]));
        if let Some(explorers) = &settings.block_explorer_urls {
            params.insert("blockExplorerUrls".into(), json!(explorers));
        }
        self.provider
            .request("wallet_addEthereumChain", json!([Value::Object(params)]))
            .await
    }
}

#[async_trait]
impl Connector for InjectedConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Injected
    }

    fn provider(&self) -> Arc<dyn ChainProvider> {
        self.provider.clone()
    }

    fn callbacks(&self) -> &ConnectorCallbacks {
        &self.callbacks
    }

    async fn connect(&self, chain_id: Option<u64>) -> Result<Network> {
        let accounts =
            self.provider
                .request_accounts()
                .await
                .map_err(|e| ConnectError::PermissionDenied {
                    connector: self.name().to_string(),
                    reason: e.to_string(),
                })?;
        let Some(account) = accounts.into_iter().next() else {
            return Err(ConnectError::EmptyAccounts {
                connector: self.name().to_string(),
            });
        };
        info!(account = %account, "Extension wallet granted access");
        self.callbacks.account_changed.emit(account);

        self.listen();
        self.callbacks.connection_changed.emit(true);

        match chain_id {
            Some(chain_id) => self.switch_chain(chain_id).await,
            None => self.get_network().await,
        }
    }

    /// Wallet-side failures are logged and swallowed; the returned network
    /// is whatever the wallet ends up on.
    async fn switch_chain(&self, chain_id: u64) -> Result<Network> {
        let settings = self.chains.require(chain_id)?;

        match self.request_switch(chain_id).await {
            Ok(_) => debug!(chain_id, "Wallet switched chain"),
            Err(e) if e.rpc_code() == Some(UNRECOGNIZED_CHAIN) => {
                debug!(chain_id, "Chain unknown to wallet, registering it");
                match self.request_add(settings).await {
                    Ok(_) => {
                        if let Err(e) = self.request_switch(chain_id).await {
                            warn!(chain_id, error = %e, "Switch after adding chain failed");
                        }
                    }
                    Err(e) => warn!(chain_id, error = %e, "Adding chain to wallet failed"),
                }
            }
            Err(e) => warn!(chain_id, error = %e, "Wallet chain switch failed"),
        }

        self.get_network().await
    }

    /// The extension keeps its permission grant; only our listener goes.
    async fn disconnect(&self) -> Result<()> {
        let id = self
            .listener
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(id) = id {
            self.wallet().unsubscribe(id);
            debug!("Removed extension wallet listener");
        }
        Ok(())
    }
}
