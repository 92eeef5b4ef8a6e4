//! # web3sdk Testing Infrastructure
//!
//! Testing utilities shared by the web3sdk crates:
//! - Scripted EIP-1193 wallet ([`MockWallet`])
//! - Relay pairing that hands out mock sessions ([`MockRelay`])
//! - Host environment with configurable capabilities ([`MockEnvironment`])
//! - Mock JSON-RPC endpoints ([`rpc`])
//! - Edge case data and property-based testing strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use web3sdk_testing::*;
//!
//! let wallet = MockWallet::new(1).with_accounts(["0xabc"]).shared();
//! let env = MockEnvironment::with_extension(wallet.clone());
//! let connector = InjectedConnector::new(networks, &env)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod relay;
pub mod rpc;
pub mod wallet;

pub use relay::{MockRelay, MockRelaySession};
pub use wallet::{MockWallet, RecordedCall};

use proptest::prelude::*;
use std::sync::Arc;
use web3sdk_provider::{RelayPairing, WalletEnvironment, WalletProvider};

// ============================================================================
// Mock Environment
// ============================================================================

/// Host environment with configurable wallet capabilities
#[derive(Clone, Default)]
pub struct MockEnvironment {
    browser: bool,
    injected: Option<Arc<MockWallet>>,
    relay: Option<Arc<MockRelay>>,
}

impl MockEnvironment {
    /// No browser, no wallets
    pub fn headless() -> Self {
        Self::default()
    }

    /// A browser window without an extension wallet
    pub fn browser_without_wallet() -> Self {
        Self {
            browser: true,
            ..Self::default()
        }
    }

    /// A browser window with `wallet` injected
    pub fn with_extension(wallet: Arc<MockWallet>) -> Self {
        Self {
            browser: true,
            injected: Some(wallet),
            relay: None,
        }
    }

    /// Adds a relay pairing service
    pub fn with_relay(mut self, relay: Arc<MockRelay>) -> Self {
        self.relay = Some(relay);
        self
    }
}

impl WalletEnvironment for MockEnvironment {
    fn is_browser(&self) -> bool {
        self.browser
    }

    fn injected_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        if !self.browser {
            return None;
        }
        self.injected
            .clone()
            .map(|wallet| wallet as Arc<dyn WalletProvider>)
    }

    fn relay_pairing(&self) -> Option<Arc<dyn RelayPairing>> {
        self.relay
            .clone()
            .map(|relay| relay as Arc<dyn RelayPairing>)
    }
}

// ============================================================================
// Edge Case Data
// ============================================================================

/// Edge case chain ids and persisted values
pub struct EdgeCaseChains;

impl EdgeCaseChains {
    /// Ethereum mainnet
    pub const MAINNET: u64 = 1;
    /// Polygon
    pub const POLYGON: u64 = 137;
    /// BNB Smart Chain
    pub const BSC: u64 = 56;
    /// Chain id no preset knows
    pub const UNKNOWN: u64 = 424_242;

    /// Persisted chain id values that must be treated as absent
    pub fn unparsable_cached_values() -> Vec<&'static str> {
        vec!["", "abc", "-1", "0xzz", "1.5", "137 matic"]
    }
}

/// Edge case account addresses
pub struct EdgeCaseAccounts;

impl EdgeCaseAccounts {
    /// A well-formed account
    pub const ALICE: &'static str = "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9";
    /// A second well-formed account
    pub const BOB: &'static str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    /// Zero address
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Generates chain ids in the range wallets accept
pub fn chain_id() -> impl Strategy<Value = u64> {
    1u64..=4_294_967_295u64
}

/// Generates a non-empty list of distinct chain ids
pub fn distinct_chain_ids(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::btree_set(chain_id(), 1..=max_len.max(1))
        .prop_map(|set| set.into_iter().collect())
}

/// Generates `0x`-prefixed 20-byte account addresses
pub fn account_address() -> impl Strategy<Value = String> {
    prop::array::uniform20(any::<u8>()).prop_map(|bytes| format!("0x{}", hex::encode(bytes)))
}
