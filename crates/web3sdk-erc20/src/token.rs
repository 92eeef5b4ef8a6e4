//! ERC-20 read calls over any [`ChainProvider`].

use crate::cache::{QueryCache, QueryKey};
use crate::error::{Erc20Error, Result};
use alloy::primitives::utils::format_units;
use alloy::primitives::{address, hex, Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use web3sdk_provider::ChainProvider;

/// USDC on Ethereum mainnet
pub const USDC_MAINNET: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

sol! {
    /// Read-only slice of the ERC-20 interface
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

/// Token name, symbol and decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
struct CacheScope {
    cache: Arc<QueryCache>,
    chain_id: u64,
}

/// An ERC-20 contract reached through a provider.
///
/// Calls are sent as `eth_call` against the latest block. With
/// [`with_cache`](Self::with_cache) results are shared through a
/// [`QueryCache`] scoped to one chain.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    address: Address,
    provider: Arc<dyn ChainProvider>,
    cache: Option<CacheScope>,
}

impl Erc20Token {
    pub fn new(address: Address, provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            address,
            provider,
            cache: None,
        }
    }

    /// Parses a hex token address
    pub fn parse(address: &str, provider: Arc<dyn ChainProvider>) -> Result<Self> {
        Ok(Self::new(parse_address(address)?, provider))
    }

    /// Serves repeated reads from `cache`, keyed under `chain_id`
    pub fn with_cache(mut self, cache: Arc<QueryCache>, chain_id: u64) -> Self {
        self.cache = Some(CacheScope { cache, chain_id });
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn name(&self) -> Result<String> {
        self.query(IERC20::nameCall {}, None, None).await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.query(IERC20::symbolCall {}, None, None).await
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.query(IERC20::decimalsCall {}, None, None).await
    }

    pub async fn total_supply(&self) -> Result<U256> {
        self.query(IERC20::totalSupplyCall {}, None, None).await
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.query(IERC20::balanceOfCall { account: owner }, Some(owner), None)
            .await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.query(
            IERC20::allowanceCall { owner, spender },
            Some(owner),
            Some(spender),
        )
        .await
    }

    pub async fn metadata(&self) -> Result<TokenMetadata> {
        Ok(TokenMetadata {
            address: self.address,
            name: self.name().await?,
            symbol: self.symbol().await?,
            decimals: self.decimals().await?,
        })
    }

    /// Balance of `owner` scaled by the token's decimals, e.g. `"12.5"`
    pub async fn formatted_balance(&self, owner: Address) -> Result<String> {
        let balance = self.balance_of(owner).await?;
        let decimals = self.decimals().await?;
        format_units(balance, decimals).map_err(|e| Erc20Error::Decode {
            query: IERC20::balanceOfCall::SIGNATURE,
            reason: e.to_string(),
        })
    }

    async fn query<C>(
        &self,
        call: C,
        owner: Option<Address>,
        spender: Option<Address>,
    ) -> Result<C::Return>
    where
        C: SolCall,
        C::Return: Serialize + DeserializeOwned,
    {
        let Some(scope) = &self.cache else {
            return self.call(call).await;
        };
        let key = QueryKey {
            query: C::SIGNATURE,
            chain_id: scope.chain_id,
            token: self.address,
            owner,
            spender,
        };
        scope.cache.get_or_fetch(key, || self.call(call)).await
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let data = hex::encode_prefixed(call.abi_encode());
        debug!(token = %self.address, query = C::SIGNATURE, "eth_call");

        let raw = self
            .provider
            .request(
                "eth_call",
                json!([{ "to": self.address.to_string(), "data": data }, "latest"]),
            )
            .await
            .map_err(|source| Erc20Error::Call {
                query: C::SIGNATURE,
                source,
            })?;

        let decode_err = |reason: String| Erc20Error::Decode {
            query: C::SIGNATURE,
            reason,
        };
        let encoded = raw
            .as_str()
            .ok_or_else(|| decode_err(format!("expected hex string, got {raw}")))?;
        let bytes = hex::decode(encoded).map_err(|e| decode_err(e.to_string()))?;
        C::abi_decode_returns(&bytes).map_err(|e| decode_err(e.to_string()))
    }
}

/// Parses a `0x`-prefixed hex address
pub fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw).map_err(|_| Erc20Error::InvalidAddress(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap(),
            USDC_MAINNET
        );
        assert!(matches!(
            parse_address("0x1234"),
            Err(Erc20Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_selectors_match_standard() {
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IERC20::decimalsCall::SELECTOR, [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(IERC20::allowanceCall::SIGNATURE, "allowance(address,address)");
    }
}
