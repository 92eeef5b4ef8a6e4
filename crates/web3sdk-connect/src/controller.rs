//! Connection lifecycle: connect, disconnect, switch chain, auto-connect.

use crate::connector::{Connector, NetworkConnector};
use crate::context::ConnectionContext;
use crate::state::ConnectionState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use web3sdk_error::Result;
use web3sdk_provider::{Network, RpcClient};

fn same_connector(a: &Arc<dyn Connector>, b: &Arc<dyn Connector>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Drives connectors and keeps the [`ConnectionContext`] in sync with them.
#[derive(Debug, Clone)]
pub struct ConnectionController {
    context: Arc<ConnectionContext>,
    client: Arc<RpcClient>,
}

impl ConnectionController {
    pub fn new(context: Arc<ConnectionContext>, client: Arc<RpcClient>) -> Self {
        Self { context, client }
    }

    pub fn context(&self) -> &Arc<ConnectionContext> {
        &self.context
    }

    pub fn state(&self) -> ConnectionState {
        self.context.state()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.context.subscribe()
    }

    pub fn current_connector(&self) -> Arc<dyn Connector> {
        self.state().connector
    }

    pub fn account_address(&self) -> Option<String> {
        self.state().account_address
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state().connecting
    }

    pub fn selected_network(&self) -> Option<u64> {
        self.state().selected_network
    }

    pub fn desired_network(&self) -> u64 {
        self.state().desired_network
    }

    /// Points the connector's callbacks at the context. The callbacks hold
    /// the context weakly, so a dropped session silences stale connectors.
    fn wire(&self, connector: &Arc<dyn Connector>) {
        let ctx = Arc::downgrade(&self.context);
        connector.set_connection_changed_callback(Arc::new(move |connected: bool| {
            if let Some(ctx) = ctx.upgrade() {
                ctx.set_connected(connected);
            }
        }));

        let ctx = Arc::downgrade(&self.context);
        connector.set_account_changed_callback(Arc::new(move |account: String| {
            if let Some(ctx) = ctx.upgrade() {
                ctx.set_account_address(Some(account));
            }
        }));

        let ctx = Arc::downgrade(&self.context);
        connector.set_network_changed_callback(Arc::new(move |network: Network| {
            if let Some(ctx) = ctx.upgrade() {
                ctx.set_network(Some(network.chain_id));
            }
        }));
    }

    /// Connects `connector` to the desired network and makes it active.
    ///
    /// Any failure resets the session to the disconnected state before the
    /// error is returned. `connecting` is cleared on every path.
    pub async fn connect(&self, connector: Arc<dyn Connector>) -> Result<Network> {
        self.wire(&connector);
        self.context.set_connecting(true);

        let desired = self.context.state().desired_network;
        debug!(connector = connector.name(), desired, "Connecting");

        let outcome = match connector.connect(Some(desired)).await {
            Ok(network) => {
                self.context.set_network(Some(network.chain_id));
                let previous = self.context.state().connector;
                if !same_connector(&previous, &connector) {
                    previous.callbacks().clear();
                    self.context.set_connector(connector.clone());
                }
                self.context.preferences().set_connector(connector.name());
                info!(connector = connector.name(), network = %network, "Connected");
                Ok(network)
            }
            Err(e) => {
                warn!(connector = connector.name(), error = %e, "Connect failed, resetting");
                if !same_connector(&self.context.state().connector, &connector) {
                    connector.callbacks().clear();
                }
                if let Err(reset) = self.disconnect().await {
                    warn!(error = %reset, "Reset after failed connect failed");
                }
                Err(e)
            }
        };

        self.context.set_connecting(false);
        outcome
    }

    /// Releases the active connector and falls back to a fresh read-only one.
    ///
    /// Idempotent: a second call leaves the same state.
    pub async fn disconnect(&self) -> Result<()> {
        let current = self.context.state().connector;
        current.callbacks().clear();
        if let Err(e) = current.disconnect().await {
            warn!(connector = current.name(), error = %e, "Connector disconnect failed");
        }

        self.context.set_account_address(None);
        let fallback = NetworkConnector::with_client(
            self.context.networks().supported_networks(),
            self.client.clone(),
        )?;
        self.context.set_connector(Arc::new(fallback));
        self.context.preferences().clear_connector();
        self.context.set_connected(false);
        // Last, so auto-connect re-arms against the fallback connector.
        self.context.set_network(None);

        info!("Disconnected");
        Ok(())
    }

    /// Switches the active connector to `chain_id`.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<Network> {
        let connector = self.context.state().connector;
        let network = connector.switch_chain(chain_id).await?;
        self.context.set_network(Some(network.chain_id));
        info!(network = %network, "Switched chain");
        Ok(network)
    }

    /// Connects the active connector if no network is selected, nothing is
    /// in flight, and auto-connect is armed. Returns `None` when it did
    /// nothing.
    pub async fn auto_connect(&self) -> Option<Result<Network>> {
        let state = self.context.state();
        if !state.needs_auto_connect() || !self.context.take_auto_connect_trigger() {
            return None;
        }
        debug!(connector = state.connector.name(), "Auto-connecting");
        Some(self.connect(state.connector).await)
    }

    /// Runs [`auto_connect`](Self::auto_connect) after every state change.
    ///
    /// Never returns while the session is alive; spawn it and abort the task
    /// when the session ends.
    pub async fn drive_auto_connect(&self) {
        let mut changes = self.subscribe();
        loop {
            if let Some(Err(e)) = self.auto_connect().await {
                debug!(error = %e, "Auto-connect failed");
            }
            if changes.changed().await.is_err() {
                break;
            }
        }
    }
}
