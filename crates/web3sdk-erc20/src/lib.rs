//! ERC-20 read helpers for web3sdk
//!
//! [`Erc20Token`] runs the view functions of a token contract as `eth_call`
//! through any [`ChainProvider`](web3sdk_provider::ChainProvider): the
//! read-only endpoint, an extension wallet or a relay session. Share a
//! [`QueryCache`] between tokens to avoid repeated reads; keys carry the
//! chain id.
//!
//! Transaction submission (`approve`, `transfer`) is out of scope.

#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod token;

pub use cache::{QueryCache, QueryKey, DEFAULT_TTL};
pub use error::{Erc20Error, Result};
pub use token::{parse_address, Erc20Token, TokenMetadata, IERC20, USDC_MAINNET};

/// Common imports
pub mod prelude {
    pub use super::{Erc20Token, QueryCache, TokenMetadata};
}
