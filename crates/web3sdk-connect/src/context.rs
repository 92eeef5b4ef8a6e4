//! Session-scoped connection state.

use crate::config::NetworksConfig;
use crate::connector::Connector;
use crate::state::ConnectionState;
use crate::storage::Preferences;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Holds the [`ConnectionState`] of one session and publishes every change.
///
/// Writes are last-write-wins. Wallet events may land between the steps of a
/// connect; each setter touches a single field so reordering stays harmless.
pub struct ConnectionContext {
    networks: NetworksConfig,
    preferences: Preferences,
    state: watch::Sender<ConnectionState>,
    auto_connect_armed: AtomicBool,
}

impl ConnectionContext {
    /// Auto-connect starts out armed.
    pub fn new(
        networks: NetworksConfig,
        preferences: Preferences,
        connector: Arc<dyn Connector>,
        desired_network: u64,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::new(connector, desired_network));
        Self {
            networks,
            preferences,
            state,
            auto_connect_armed: AtomicBool::new(true),
        }
    }

    pub fn networks(&self) -> &NetworksConfig {
        &self.networks
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn set_connector(&self, connector: Arc<dyn Connector>) {
        debug!(connector = connector.name(), "Active connector replaced");
        self.state.send_modify(|state| state.connector = connector);
    }

    pub fn set_account_address(&self, account: Option<String>) {
        self.state.send_if_modified(|state| {
            if state.account_address == account {
                return false;
            }
            debug!(account = ?account, "Account changed");
            state.account_address = account;
            true
        });
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.connected != connected;
            state.connected = connected;
            changed
        });
    }

    pub fn set_connecting(&self, connecting: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.connecting != connecting;
            state.connecting = connecting;
            changed
        });
    }

    /// Records the confirmed chain.
    ///
    /// A supported chain also becomes the desired network and is persisted.
    /// Going from some network to none arms auto-connect.
    pub fn set_network(&self, network: Option<u64>) {
        let mut rearm = false;
        self.state.send_if_modified(|state| {
            let previous = state.selected_network;
            state.selected_network = network;
            rearm = previous.is_some() && network.is_none();

            let mut changed = previous != network;
            if let Some(chain_id) = network {
                if self.networks.contains(chain_id) && state.desired_network != chain_id {
                    state.desired_network = chain_id;
                    changed = true;
                }
            }
            changed
        });

        if let Some(chain_id) = network.filter(|id| self.networks.contains(*id)) {
            self.preferences.set_chain_id(chain_id);
        }
        if rearm {
            debug!("Selected network cleared, auto-connect armed");
            self.auto_connect_armed.store(true, Ordering::SeqCst);
        }
    }

    pub fn auto_connect_armed(&self) -> bool {
        self.auto_connect_armed.load(Ordering::SeqCst)
    }

    /// Disarms the trigger, returning whether it was armed.
    pub(crate) fn take_auto_connect_trigger(&self) -> bool {
        self.auto_connect_armed.swap(false, Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("state", &*self.state.borrow())
            .field("auto_connect_armed", &self.auto_connect_armed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NativeCurrency, NetworkSettings};
    use crate::connector::NetworkConnector;
    use crate::storage::CHAIN_ID_CACHE_KEY;

    fn context() -> ConnectionContext {
        let chains: Vec<NetworkSettings> = [1u64, 137]
            .iter()
            .map(|&id| {
                NetworkSettings::new(
                    id,
                    format!("chain {id}"),
                    NativeCurrency::new("Ether", "ETH"),
                    format!("https://rpc.example/{id}"),
                )
            })
            .collect();
        let connector = Arc::new(NetworkConnector::new(&chains).unwrap());
        let networks = NetworksConfig::new(chains, 1).unwrap();
        ConnectionContext::new(networks, Preferences::in_memory(), connector, 1)
    }

    #[test]
    fn test_supported_network_updates_desired_and_cache() {
        let ctx = context();
        ctx.set_network(Some(137));

        let state = ctx.state();
        assert_eq!(state.selected_network, Some(137));
        assert_eq!(state.desired_network, 137);
        assert_eq!(
            ctx.preferences().store().get(CHAIN_ID_CACHE_KEY).unwrap().as_deref(),
            Some("137")
        );
    }

    #[test]
    fn test_unsupported_network_only_sets_selected() {
        let ctx = context();
        ctx.set_network(Some(56));

        let state = ctx.state();
        assert_eq!(state.selected_network, Some(56));
        assert_eq!(state.desired_network, 1);
        assert_eq!(ctx.preferences().cached_chain_id(), None);
    }

    #[test]
    fn test_rearm_only_on_some_to_none() {
        let ctx = context();
        assert!(ctx.take_auto_connect_trigger());

        ctx.set_network(None);
        assert!(!ctx.auto_connect_armed());

        ctx.set_network(Some(1));
        assert!(!ctx.auto_connect_armed());
        ctx.set_network(None);
        assert!(ctx.auto_connect_armed());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let ctx = context();
        let mut rx = ctx.subscribe();

        ctx.set_connected(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().connected);

        ctx.set_connected(true);
        assert!(!rx.has_changed().unwrap());
    }
}
