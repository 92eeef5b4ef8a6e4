//! # web3sdk Connect
//!
//! Wallet connection layer for dApps. Connects to Ethereum-compatible wallets
//! (browser extension, relay-paired wallet) or falls back to a read-only
//! JSON-RPC endpoint, and tracks the connection lifecycle.
//!
//! ## Pieces
//!
//! - [`NetworksConfig`]: supported chains; [`presets`] for well-known ones
//! - [`Connector`]: [`NetworkConnector`], [`InjectedConnector`], [`RelayConnector`]
//! - [`ConnectionContext`]: session state, observable through a watch channel
//! - [`ConnectionController`]: connect / disconnect / switch chain / auto-connect
//! - [`Web3Session`]: builds all of the above from cached [`Preferences`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use web3sdk_connect::prelude::*;
//!
//! let networks = NetworksConfig::single(network_settings(
//!     CoreNetwork::Mainnet,
//!     "https://cloudflare-eth.com/",
//! ))?;
//! let session = Web3Session::new(
//!     networks,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(HeadlessEnvironment),
//! )?;
//!
//! let connector = session.connection().current_connector();
//! let network = session.connection().connect(connector).await?;
//! println!("read-only on {network}");
//! ```

#![forbid(unsafe_code)]

pub mod callbacks;
pub mod config;
pub mod connector;
pub mod context;
pub mod controller;
pub mod presets;
pub mod selection;
pub mod session;
pub mod state;
pub mod storage;

pub use callbacks::{Callback, CallbackSlot, ConnectorCallbacks};
pub use config::{CurrentNetwork, NativeCurrency, NetworkSettings, NetworksConfig};
pub use connector::{
    AllowedChains, Connector, ConnectorKind, InjectedConnector, NetworkConnector, RelayConnector,
};
pub use context::ConnectionContext;
pub use controller::ConnectionController;
pub use presets::{network_settings, CoreNetwork};
pub use selection::{build_connector, resolve_desired_chain, select_connector};
pub use session::Web3Session;
pub use state::{ConnectionPhase, ConnectionState};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageStore;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
pub use storage::{
    MemoryStore, PreferenceStore, Preferences, CHAIN_ID_CACHE_KEY, CONNECTOR_CACHE_KEY,
};

pub use web3sdk_error::{ConnectError, ErrorCategory, Result};
pub use web3sdk_provider::{
    ChainProvider, HeadlessEnvironment, Network, WalletEnvironment, WalletEvent,
};

/// Common imports
pub mod prelude {
    pub use crate::{
        network_settings, ConnectionController, ConnectionPhase, ConnectionState, Connector,
        ConnectorKind, CoreNetwork, MemoryStore, NetworkSettings, NetworksConfig,
        PreferenceStore, Web3Session,
    };
    pub use web3sdk_error::{ConnectError, Result};
    pub use web3sdk_provider::{ChainProvider, HeadlessEnvironment, Network};
}
