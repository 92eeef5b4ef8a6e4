//! The provider handle a connector owns.

use crate::network::{parse_chain_id, Network};
use crate::rpc::{ProviderError, RpcClient};
use crate::wallet::WalletProvider;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use url::Url;
use web3sdk_error::{ConnectError, Result};

/// What backs a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Plain HTTP JSON-RPC endpoint, read-only
    JsonRpc,
    /// EIP-1193 wallet (extension or relay session)
    Wallet,
}

/// A chain-interaction handle.
#[async_trait]
pub trait ChainProvider: Send + Sync + fmt::Debug {
    /// What backs this provider
    fn kind(&self) -> ProviderKind;

    /// Sends a raw JSON-RPC request
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Queries the provider for its current network.
    ///
    /// Any failure is reported as [`ConnectError::ProviderUnreachable`].
    async fn get_network(&self) -> Result<Network> {
        let chain_id = query_chain_id(self).await?;
        Ok(Network::from_chain_id(chain_id))
    }
}

async fn query_chain_id<P: ChainProvider + ?Sized>(provider: &P) -> Result<u64> {
    let raw = provider
        .request("eth_chainId", json!([]))
        .await
        .map_err(ConnectError::unreachable)?;
    parse_chain_id(&raw).map_err(ConnectError::unreachable)
}

/// Read-only provider over an HTTP JSON-RPC endpoint, pinned to one chain.
#[derive(Debug, Clone)]
pub struct JsonRpcProvider {
    url: Url,
    chain_id: u64,
    client: Arc<RpcClient>,
}

impl JsonRpcProvider {
    /// Creates a provider with its own HTTP client
    pub fn new(url: &str, chain_id: u64) -> Result<Self> {
        let client = RpcClient::new().map_err(ConnectError::from)?;
        Self::with_client(url, chain_id, Arc::new(client))
    }

    /// Creates a provider sharing an existing HTTP client
    pub fn with_client(url: &str, chain_id: u64, client: Arc<RpcClient>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ConnectError::InvalidRpcUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            url,
            chain_id,
            client,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Chain this provider was built for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ChainProvider for JsonRpcProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::JsonRpc
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.client
            .rpc_call::<_, Value>(self.url.as_str(), method, params)
            .await
            .map_err(|e| match e {
                ProviderError::RpcError { code, message } => ConnectError::Rpc {
                    method: method.to_string(),
                    code,
                    message,
                },
                other => other.into(),
            })
    }

    async fn get_network(&self) -> Result<Network> {
        let got = query_chain_id(self).await?;
        if got != self.chain_id {
            return Err(ConnectError::ProviderUnreachable {
                reason: ConnectError::ChainIdMismatch {
                    expected: self.chain_id,
                    got,
                }
                .to_string(),
            });
        }
        Ok(Network::from_chain_id(got))
    }
}

/// Provider speaking through an EIP-1193 wallet.
#[derive(Clone)]
pub struct Web3Provider {
    wallet: Arc<dyn WalletProvider>,
}

impl Web3Provider {
    /// Wraps a wallet provider
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }

    /// The wrapped wallet
    pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet
    }

    /// Sends `eth_requestAccounts`, prompting the user if needed
    pub async fn request_accounts(&self) -> Result<Vec<String>> {
        let raw = self.request("eth_requestAccounts", json!([])).await?;
        serde_json::from_value(raw).map_err(ConnectError::from)
    }
}

impl fmt::Debug for Web3Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Provider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ChainProvider for Web3Provider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wallet
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.wallet
            .request(method, params)
            .await
            .map_err(|e| ConnectError::Rpc {
                method: method.to_string(),
                code: e.code,
                message: e.message,
            })
    }
}
