//! # web3sdk
//!
//! Connects Ethereum dApps to wallets: a browser extension, a relay-paired
//! mobile wallet, or a read-only JSON-RPC fallback. One façade over the
//! workspace crates.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | Connection layer + `erc20` |
//! | `erc20` | ERC-20 read helpers and query cache |
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! web3sdk = "0.1"
//!
//! # Connection layer only
//! web3sdk = { version = "0.1", default-features = false }
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use web3sdk::prelude::*;
//!
//! let networks = NetworksConfig::single(network_settings(CoreNetwork::Polygon, rpc_url))?;
//! let session = Web3Session::new(networks, Arc::new(MemoryStore::new()), Arc::new(HeadlessEnvironment))?;
//! let network = session.connection().connect(session.connection().current_connector()).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Connectors, connection state and preferences
pub use web3sdk_connect as connect;

/// Error taxonomy
pub use web3sdk_error as error;

/// Chain providers and wallet interfaces
pub use web3sdk_provider as provider;

/// ERC-20 read helpers
#[cfg(feature = "erc20")]
#[cfg_attr(docsrs, doc(cfg(feature = "erc20")))]
pub use web3sdk_erc20 as erc20;

/// Prelude module for convenient imports
///
/// ```ignore
/// use web3sdk::prelude::*;
/// ```
pub mod prelude {
    pub use web3sdk_connect::prelude::*;

    #[cfg(feature = "erc20")]
    pub use web3sdk_erc20::prelude::*;
}

/// Returns the web3sdk version
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns the optional features compiled in
pub fn enabled_features() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut features = Vec::new();

    #[cfg(feature = "erc20")]
    features.push("erc20");

    features
}
