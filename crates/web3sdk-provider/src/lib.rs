//! # web3sdk Provider
//!
//! Chain providers for the web3sdk connection layer. A provider is the handle
//! a connector owns to talk to a chain: either a read-only JSON-RPC endpoint
//! or a wallet (browser extension or relay session) speaking EIP-1193.
//!
//! ## Features
//!
//! - [`RpcClient`]: pooled HTTP JSON-RPC client; [`TransportConfig`] sets
//!   its timeout and [`Throttle`]
//! - [`ChainProvider`]: the capability every connector exposes
//! - [`JsonRpcProvider`]: read-only provider pinned to one chain
//! - [`Web3Provider`]: provider backed by a [`WalletProvider`]
//! - [`WalletEnvironment`], [`RelayPairing`]: the host capabilities connectors
//!   are built from
//!
//! ## Example
//!
//! ```ignore
//! use web3sdk_provider::{ChainProvider, JsonRpcProvider};
//!
//! let provider = JsonRpcProvider::new("https://cloudflare-eth.com/", 1)?;
//! let network = provider.get_network().await?;
//! assert_eq!(network.chain_id, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod network;
pub mod provider;
pub mod rpc;
pub mod wallet;

pub use network::{parse_chain_id, to_hex_chain_id, Network};
pub use provider::{ChainProvider, JsonRpcProvider, ProviderKind, Web3Provider};
pub use rpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ProviderError, RpcClient, Throttle,
    TransportConfig,
};
pub use wallet::{
    HeadlessEnvironment, RelayOptions, RelayPairing, RelaySession, WalletEnvironment,
    ListenerId, WalletEvent, WalletListener, WalletProvider, WalletRpcError,
};

pub use web3sdk_error::{ConnectError, Result};
