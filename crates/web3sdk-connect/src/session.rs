//! Entry point tying configuration, preferences and the controller together.

use crate::config::{CurrentNetwork, NetworksConfig};
use crate::connector::{Connector, ConnectorKind};
use crate::context::ConnectionContext;
use crate::controller::ConnectionController;
use crate::selection::{build_connector, resolve_desired_chain, select_connector};
use crate::storage::{PreferenceStore, Preferences};
use std::sync::Arc;
use tracing::info;
use web3sdk_error::{ConnectError, Result};
use web3sdk_provider::{ChainProvider, JsonRpcProvider, RpcClient, WalletEnvironment};

/// One application session: supported networks, the host environment, and
/// the connection state.
///
/// ```ignore
/// let session = Web3Session::new(networks, Arc::new(MemoryStore::new()), Arc::new(HeadlessEnvironment))?;
/// let controller = session.connection().clone();
/// tokio::spawn(async move { controller.drive_auto_connect().await });
/// ```
pub struct Web3Session {
    environment: Arc<dyn WalletEnvironment>,
    client: Arc<RpcClient>,
    controller: ConnectionController,
}

impl Web3Session {
    pub fn new(
        networks: NetworksConfig,
        store: Arc<dyn PreferenceStore>,
        environment: Arc<dyn WalletEnvironment>,
    ) -> Result<Self> {
        let client = Arc::new(RpcClient::new()?);
        Self::with_client(networks, store, environment, client)
    }

    /// Picks the initial connector from the cached connector name and the
    /// desired network from the cached chain id.
    pub fn with_client(
        networks: NetworksConfig,
        store: Arc<dyn PreferenceStore>,
        environment: Arc<dyn WalletEnvironment>,
        client: Arc<RpcClient>,
    ) -> Result<Self> {
        let preferences = Preferences::new(store);
        let cached_connector = preferences.cached_connector();
        let connector = select_connector(
            &networks,
            cached_connector.as_deref(),
            environment.as_ref(),
            client.clone(),
        )?;
        let desired = resolve_desired_chain(&networks, preferences.cached_chain_id());
        info!(
            connector = connector.name(),
            desired_network = desired,
            "Session initialised"
        );

        let context = Arc::new(ConnectionContext::new(
            networks,
            preferences,
            connector,
            desired,
        ));
        Ok(Self {
            environment,
            client: client.clone(),
            controller: ConnectionController::new(context, client),
        })
    }

    pub fn networks(&self) -> &NetworksConfig {
        self.controller.context().networks()
    }

    /// The networks config plus settings for the desired network.
    pub fn network_config(&self) -> Result<CurrentNetwork> {
        CurrentNetwork::resolve(self.networks(), self.controller.desired_network())
    }

    /// The active connector's provider, or with `chain_id` a fresh read-only
    /// provider for that supported chain.
    pub fn provider(&self, chain_id: Option<u64>) -> Result<Arc<dyn ChainProvider>> {
        let Some(chain_id) = chain_id else {
            return Ok(self.controller.current_connector().provider());
        };
        let settings = self
            .networks()
            .find(chain_id)
            .ok_or(ConnectError::UnsupportedNetwork(chain_id))?;
        Ok(Arc::new(JsonRpcProvider::with_client(
            &settings.rpc_url,
            settings.chain_id,
            self.client.clone(),
        )?))
    }

    /// A new connector of `kind`, to hand to
    /// [`ConnectionController::connect`].
    pub fn connector(&self, kind: ConnectorKind) -> Result<Arc<dyn Connector>> {
        build_connector(
            kind,
            self.networks(),
            self.environment.as_ref(),
            self.client.clone(),
        )
    }

    pub fn connection(&self) -> &ConnectionController {
        &self.controller
    }

    pub fn environment(&self) -> &Arc<dyn WalletEnvironment> {
        &self.environment
    }
}

impl std::fmt::Debug for Web3Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web3Session")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
