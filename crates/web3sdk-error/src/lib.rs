//! # web3sdk Error
//!
//! Unified error types for the web3sdk wallet connection layer. Every crate in
//! the workspace reports failures through [`ConnectError`], so the connection
//! controller can decide in one place whether a failure is a configuration
//! bug to propagate or a runtime failure to reset from.
//!
//! ## Error Categories
//!
//! - Configuration: zero chains, duplicate chains, chain not in allowed set
//! - Capability: no browser context, no extension wallet
//! - User: permission denied, empty account list
//! - Network: provider unreachable, wallet RPC errors, unsupported chain
//! - Storage: persisted preference read/write failures
//!
//! ## Example
//!
//! ```
//! use web3sdk_error::{ConnectError, ErrorCategory, Result};
//!
//! fn require_chain(allowed: &[u64], chain_id: u64) -> Result<()> {
//!     if !allowed.contains(&chain_id) {
//!         return Err(ConnectError::ChainNotAllowed {
//!             connector: "NetworkConnector".into(),
//!             chain_id,
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_chain(&[1, 137], 56).unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::Configuration);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// EIP-1193 code a wallet returns when the user rejects a request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// EIP-1193 code a wallet returns when it does not know the requested chain.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// The main error type for wallet connection operations.
#[derive(Error, Debug)]
pub enum ConnectError {
    // ============ Configuration Errors ============
    /// A connector or network config was built with an empty chain list
    #[error("{context}: must supply at least one chain")]
    NoChainsConfigured {
        /// Component that rejected the configuration
        context: String,
    },

    /// Chain id is not part of the connector's allowed chains
    #[error("{connector}: chain id {chain_id} not in allowed chains")]
    ChainNotAllowed {
        /// Connector name
        connector: String,
        /// Requested chain id
        chain_id: u64,
    },

    /// Chain id is not part of the supported networks
    #[error("network {0} is not in supported networks")]
    UnsupportedNetwork(u64),

    /// The same chain id appears twice in a network list
    #[error("duplicate chain id {0} in supported networks")]
    DuplicateChainId(u64),

    /// Default chain id does not reference a supported network
    #[error("default chain id {0} is not in supported networks")]
    DefaultChainMissing(u64),

    /// RPC URL could not be parsed
    #[error("invalid RPC url '{url}': {reason}")]
    InvalidRpcUrl {
        /// The invalid URL
        url: String,
        /// Parse failure
        reason: String,
    },

    /// Generic configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Capability Errors ============
    /// The environment cannot host the requested connector
    #[error("{connector}: {reason}")]
    CapabilityUnavailable {
        /// Connector name
        connector: String,
        /// What is missing
        reason: String,
    },

    // ============ User-facing Errors ============
    /// The user did not grant account access
    #[error("{connector}: user did not accept permissions ({reason})")]
    PermissionDenied {
        /// Connector name
        connector: String,
        /// Wallet-supplied reason
        reason: String,
    },

    /// The wallet granted access but returned no accounts
    #[error("{connector}: accounts array is empty")]
    EmptyAccounts {
        /// Connector name
        connector: String,
    },

    // ============ Network Errors ============
    /// A relay session landed on a chain outside the allowed set
    #[error("{connector}: connected chain id {chain_id} not in allowed chains")]
    UnsupportedChain {
        /// Connector name
        connector: String,
        /// Chain the session reported
        chain_id: u64,
    },

    /// The provider could not report its network
    #[error("could not fetch chain data, is the JSON-RPC endpoint valid? ({reason})")]
    ProviderUnreachable {
        /// Underlying failure
        reason: String,
    },

    /// The endpoint answered for a different chain than configured
    #[error("Invalid chain ID: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Expected chain ID
        expected: u64,
        /// Actual chain ID
        got: u64,
    },

    /// JSON-RPC or wallet request returned an error object
    #[error("RPC request failed: {method} - code={code}, message={message}")]
    Rpc {
        /// RPC method name
        method: String,
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Transport-level failure (HTTP, connection refused, ...)
    #[error("RPC transport failed: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Invalid format: {0}")]
    Format(String),

    // ============ Storage Errors ============
    /// Preference storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    // ============ Generic ============
    /// Unknown/other error
    #[error("{0}")]
    Other(String),

    /// Wrapped error from external source
    #[error("External error: {message}")]
    External {
        /// Error message
        message: String,
    },
}

/// Convenient Result type using ConnectError
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Broad classification used by the connection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Fatal misconfiguration, raised at construction or validation time
    Configuration,
    /// The environment lacks a wallet capability
    Capability,
    /// The user declined or has nothing to offer; recoverable
    User,
    /// RPC or wallet transport failure
    Network,
    /// Persisted preference failure
    Storage,
    /// Anything else
    Other,
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// No chains configured
    NoChainsConfigured = 1001,
    /// Chain not allowed
    ChainNotAllowed = 1002,
    /// Network not supported
    UnsupportedNetwork = 1003,
    /// Invalid network list
    InvalidNetworks = 1004,
    /// Capability unavailable
    CapabilityUnavailable = 2001,
    /// Permission denied
    PermissionDenied = 3001,
    /// Empty accounts
    EmptyAccounts = 3002,
    /// Unsupported chain on a relay session
    UnsupportedChain = 4001,
    /// Provider unreachable
    ProviderUnreachable = 4002,
    /// Chain id mismatch
    ChainIdMismatch = 4003,
    /// RPC error response
    RpcError = 4004,
    /// Transport error
    TransportError = 4005,
    /// Storage error
    StorageError = 5001,
}

impl ConnectError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ConnectError::NoChainsConfigured { .. } => ErrorCode::NoChainsConfigured,
            ConnectError::ChainNotAllowed { .. } => ErrorCode::ChainNotAllowed,
            ConnectError::UnsupportedNetwork(_) => ErrorCode::UnsupportedNetwork,
            ConnectError::DuplicateChainId(_)
            | ConnectError::DefaultChainMissing(_)
            | ConnectError::InvalidRpcUrl { .. } => ErrorCode::InvalidNetworks,
            ConnectError::CapabilityUnavailable { .. } => ErrorCode::CapabilityUnavailable,
            ConnectError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            ConnectError::EmptyAccounts { .. } => ErrorCode::EmptyAccounts,
            ConnectError::UnsupportedChain { .. } => ErrorCode::UnsupportedChain,
            ConnectError::ProviderUnreachable { .. } => ErrorCode::ProviderUnreachable,
            ConnectError::ChainIdMismatch { .. } => ErrorCode::ChainIdMismatch,
            ConnectError::Rpc { .. } => ErrorCode::RpcError,
            ConnectError::Transport(_) => ErrorCode::TransportError,
            ConnectError::Storage(_) => ErrorCode::StorageError,
            _ => ErrorCode::Unknown,
        }
    }

    /// Returns the broad category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConnectError::NoChainsConfigured { .. }
            | ConnectError::ChainNotAllowed { .. }
            | ConnectError::UnsupportedNetwork(_)
            | ConnectError::DuplicateChainId(_)
            | ConnectError::DefaultChainMissing(_)
            | ConnectError::InvalidRpcUrl { .. }
            | ConnectError::Config(_) => ErrorCategory::Configuration,
            ConnectError::CapabilityUnavailable { .. } => ErrorCategory::Capability,
            ConnectError::PermissionDenied { .. } | ConnectError::EmptyAccounts { .. } => {
                ErrorCategory::User
            }
            ConnectError::UnsupportedChain { .. }
            | ConnectError::ProviderUnreachable { .. }
            | ConnectError::ChainIdMismatch { .. }
            | ConnectError::Rpc { .. }
            | ConnectError::Transport(_)
            | ConnectError::Format(_) => ErrorCategory::Network,
            ConnectError::Storage(_) => ErrorCategory::Storage,
            ConnectError::Other(_) | ConnectError::External { .. } => ErrorCategory::Other,
        }
    }

    /// Returns true if a user-initiated retry may succeed.
    ///
    /// Configuration and capability errors never go away without a code or
    /// environment change.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Capability
        )
    }

    /// Returns the wallet RPC error code, if this error carries one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            ConnectError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Wraps any failure as [`ConnectError::ProviderUnreachable`].
    ///
    /// Errors that already are `ProviderUnreachable` pass through unchanged.
    pub fn unreachable(err: ConnectError) -> ConnectError {
        match err {
            ConnectError::ProviderUnreachable { .. } => err,
            other => ConnectError::ProviderUnreachable {
                reason: other.to_string(),
            },
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Adds context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;

    /// Adds context using a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| ConnectError::External {
            message: format!("{}: {}", ctx.into(), e),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| ConnectError::External {
            message: format!("{}: {}", f(), e),
        })
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ConnectError::Other(ctx.into()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| ConnectError::Other(f()))
    }
}

// ============ From implementations for common error types ============

impl From<std::io::Error> for ConnectError {
    fn from(err: std::io::Error) -> Self {
        ConnectError::Storage(err.to_string())
    }
}

impl From<std::num::ParseIntError> for ConnectError {
    fn from(err: std::num::ParseIntError) -> Self {
        ConnectError::Format(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectError {
    fn from(err: serde_json::Error) -> Self {
        ConnectError::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConnectError::ChainNotAllowed {
            connector: "MetaMaskConnector".to_string(),
            chain_id: 56,
        };
        assert!(err.to_string().contains("MetaMaskConnector"));
        assert!(err.to_string().contains("56"));
    }

    #[test]
    fn test_categories() {
        let config = ConnectError::NoChainsConfigured {
            context: "NetworkConnector".into(),
        };
        assert_eq!(config.category(), ErrorCategory::Configuration);
        assert!(!config.is_recoverable());

        let capability = ConnectError::CapabilityUnavailable {
            connector: "MetaMaskConnector".into(),
            reason: "window object not detected".into(),
        };
        assert_eq!(capability.category(), ErrorCategory::Capability);
        assert!(!capability.is_recoverable());

        let user = ConnectError::EmptyAccounts {
            connector: "MetaMaskConnector".into(),
        };
        assert_eq!(user.category(), ErrorCategory::User);
        assert!(user.is_recoverable());
    }

    #[test]
    fn test_error_code() {
        let err = ConnectError::PermissionDenied {
            connector: "MetaMaskConnector".into(),
            reason: "rejected".into(),
        };
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert_eq!(ConnectError::DuplicateChainId(1).code(), ErrorCode::InvalidNetworks);
    }

    #[test]
    fn test_rpc_code() {
        let err = ConnectError::Rpc {
            method: "wallet_switchEthereumChain".into(),
            code: UNRECOGNIZED_CHAIN,
            message: "Unrecognized chain ID".into(),
        };
        assert_eq!(err.rpc_code(), Some(4902));
        assert_eq!(ConnectError::Other("x".into()).rpc_code(), None);
    }

    #[test]
    fn test_unreachable_wraps_once() {
        let wrapped = ConnectError::unreachable(ConnectError::Transport("refused".into()));
        assert!(matches!(wrapped, ConnectError::ProviderUnreachable { .. }));
        assert!(wrapped.to_string().contains("refused"));

        let again = ConnectError::unreachable(wrapped);
        assert_eq!(again.to_string().matches("could not fetch").count(), 1);
    }

    #[test]
    fn test_error_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file missing"));

        let with_ctx = result.context("Failed to load networks");
        assert!(with_ctx
            .unwrap_err()
            .to_string()
            .contains("Failed to load networks"));
    }
}
