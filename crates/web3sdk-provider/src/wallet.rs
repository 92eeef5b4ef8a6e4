//! EIP-1193 wallet capabilities supplied by the host environment.
//!
//! The connection layer never talks to a browser or a relay service
//! directly. A host (a wasm front end, a desktop shell, a test) implements
//! these traits and hands them to the connectors.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use web3sdk_error::{UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};

/// Error object returned by an EIP-1193 `request`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("wallet error {code}: {message}")]
pub struct WalletRpcError {
    /// EIP-1193 / JSON-RPC error code
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Optional extra payload
    pub data: Option<Value>,
}

impl WalletRpcError {
    /// Creates an error with the given code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The user rejected the request (code 4001)
    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    /// The wallet does not know the requested chain (code 4902)
    pub fn unrecognized_chain(chain_hex: &str) -> Self {
        Self::new(
            UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"{chain_hex}\"."),
        )
    }
}

/// Point-in-time notifications emitted by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// `accountsChanged`; empty when the user locked or revoked access
    AccountsChanged(Vec<String>),
    /// `chainChanged`, already decoded from its hex form
    ChainChanged(u64),
    /// The wallet dropped the session
    Disconnected,
}

/// Listener registered with [`WalletProvider::subscribe`].
pub type WalletListener = Arc<dyn Fn(WalletEvent) + Send + Sync>;

/// Handle for removing a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// An EIP-1193 provider: the injected extension object or a relay session.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Sends a request to the wallet
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletRpcError>;

    /// Registers a listener for wallet events
    fn subscribe(&self, listener: WalletListener) -> ListenerId;

    /// Removes a listener; unknown ids are ignored
    fn unsubscribe(&self, id: ListenerId);
}

/// Options used to open a relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// RPC url per allowed chain id
    pub rpc: BTreeMap<u64, String>,
    /// Chain the session should be pinned to
    pub chain_id: u64,
}

/// A live session with a relay-mediated wallet.
#[async_trait]
pub trait RelaySession: Send + Sync {
    /// The EIP-1193 provider speaking through this session
    fn wallet(&self) -> Arc<dyn WalletProvider>;

    /// Asks the remote wallet for its accounts
    async fn enable(&self) -> Result<Vec<String>, WalletRpcError>;

    /// Tears the session down; resolves once the relay acknowledged it
    async fn disconnect(&self) -> Result<(), WalletRpcError>;
}

/// Pairing service able to open relay sessions.
#[async_trait]
pub trait RelayPairing: Send + Sync {
    /// Opens a session restricted to `options.rpc`, pinned to `options.chain_id`
    async fn open(&self, options: RelayOptions) -> Result<Arc<dyn RelaySession>, WalletRpcError>;
}

/// Capabilities of the environment the application runs in.
pub trait WalletEnvironment: Send + Sync {
    /// Whether a browser window context exists
    fn is_browser(&self) -> bool;

    /// The injected extension provider (`window.ethereum`), if any
    fn injected_provider(&self) -> Option<Arc<dyn WalletProvider>>;

    /// The relay pairing service, if the host configured one
    fn relay_pairing(&self) -> Option<Arc<dyn RelayPairing>> {
        None
    }
}

/// Environment without a browser or any wallet: only read-only RPC works.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessEnvironment;

impl WalletEnvironment for HeadlessEnvironment {
    fn is_browser(&self) -> bool {
        false
    }

    fn injected_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_error_codes() {
        assert_eq!(WalletRpcError::user_rejected().code, 4001);
        let err = WalletRpcError::unrecognized_chain("0x89");
        assert_eq!(err.code, 4902);
        assert!(err.to_string().contains("0x89"));
    }

    #[test]
    fn test_headless_environment() {
        let env = HeadlessEnvironment;
        assert!(!env.is_browser());
        assert!(env.injected_provider().is_none());
        assert!(env.relay_pairing().is_none());
    }
}
