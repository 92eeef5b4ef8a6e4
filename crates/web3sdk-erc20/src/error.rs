//! ERC-20 query errors

use thiserror::Error;
use web3sdk_error::ConnectError;

/// Errors from ERC-20 queries
#[derive(Debug, Error)]
pub enum Erc20Error {
    /// The `eth_call` itself failed (transport, RPC error, revert)
    #[error("contract call `{query}` failed: {source}")]
    Call {
        query: &'static str,
        #[source]
        source: ConnectError,
    },

    /// The node answered with something that is not ABI data for the query
    #[error("could not decode `{query}` result: {reason}")]
    Decode { query: &'static str, reason: String },

    /// Invalid token or account address
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
}

impl Erc20Error {
    /// The underlying connection error, if the call reached the provider
    pub fn connect_error(&self) -> Option<&ConnectError> {
        match self {
            Erc20Error::Call { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<Erc20Error> for ConnectError {
    fn from(err: Erc20Error) -> Self {
        match err {
            Erc20Error::Call { source, .. } => source,
            other => ConnectError::Format(other.to_string()),
        }
    }
}

/// Result alias for ERC-20 queries
pub type Result<T> = std::result::Result<T, Erc20Error>;
