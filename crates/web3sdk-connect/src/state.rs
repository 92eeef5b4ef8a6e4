//! Connection state snapshots.

use crate::connector::{Connector, ConnectorKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Everything the UI needs to render the connection.
#[derive(Clone)]
pub struct ConnectionState {
    /// The active connector; exactly one at a time
    pub connector: Arc<dyn Connector>,
    pub account_address: Option<String>,
    pub connected: bool,
    pub connecting: bool,
    /// Last chain id confirmed by the active connector
    pub selected_network: Option<u64>,
    /// Target chain id, always a supported network
    pub desired_network: u64,
}

/// Coarse view of [`ConnectionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    /// A chain is selected but no wallet account is connected
    ReadOnly { chain_id: u64 },
    Connected { account: String, chain_id: u64 },
}

impl ConnectionState {
    pub fn new(connector: Arc<dyn Connector>, desired_network: u64) -> Self {
        Self {
            connector,
            account_address: None,
            connected: false,
            connecting: false,
            selected_network: None,
            desired_network,
        }
    }

    pub fn connector_kind(&self) -> ConnectorKind {
        self.connector.kind()
    }

    pub fn phase(&self) -> ConnectionPhase {
        if self.connecting {
            return ConnectionPhase::Connecting;
        }
        match (self.selected_network, self.connected, &self.account_address) {
            (Some(chain_id), true, Some(account)) => ConnectionPhase::Connected {
                account: account.clone(),
                chain_id,
            },
            (Some(chain_id), _, _) => ConnectionPhase::ReadOnly { chain_id },
            (None, _, _) => ConnectionPhase::Disconnected,
        }
    }

    /// No network selected and no attempt in flight.
    pub fn needs_auto_connect(&self) -> bool {
        self.selected_network.is_none() && !self.connecting
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionState")
            .field("connector", &self.connector.name())
            .field("account_address", &self.account_address)
            .field("connected", &self.connected)
            .field("connecting", &self.connecting)
            .field("selected_network", &self.selected_network)
            .field("desired_network", &self.desired_network)
            .finish()
    }
}
