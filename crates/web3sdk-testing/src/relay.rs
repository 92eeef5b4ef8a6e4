//! Relay pairing that hands out sessions backed by [`MockWallet`].

use crate::wallet::MockWallet;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use web3sdk_provider::{
    RelayOptions, RelayPairing, RelaySession, WalletEvent, WalletProvider, WalletRpcError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted relay pairing service.
///
/// Every `open` creates a fresh [`MockRelaySession`] on the requested chain,
/// unless [`MockRelay::landing_on`] pins the chain the remote wallet picks.
#[derive(Default)]
pub struct MockRelay {
    accounts: Vec<String>,
    landing_chain: Option<u64>,
    fail_open: bool,
    reject_enable: bool,
    opened: Mutex<Vec<RelayOptions>>,
    sessions: Mutex<Vec<Arc<MockRelaySession>>>,
}

impl MockRelay {
    /// Relay whose remote wallet exposes `accounts`
    pub fn new<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accounts: accounts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The remote wallet always lands on `chain_id`, whatever was requested
    pub fn landing_on(mut self, chain_id: u64) -> Self {
        self.landing_chain = Some(chain_id);
        self
    }

    /// Opening a session fails, as when the pairing modal is closed
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// The remote user rejects the account request
    pub fn rejecting_enable(mut self) -> Self {
        self.reject_enable = true;
        self
    }

    /// Wraps the relay for sharing with an environment
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Options of every `open` call, in order
    pub fn opened(&self) -> Vec<RelayOptions> {
        lock(&self.opened).clone()
    }

    /// Every session handed out, in order
    pub fn sessions(&self) -> Vec<Arc<MockRelaySession>> {
        lock(&self.sessions).clone()
    }

    /// The most recent session
    pub fn last_session(&self) -> Option<Arc<MockRelaySession>> {
        lock(&self.sessions).last().cloned()
    }
}

#[async_trait]
impl RelayPairing for MockRelay {
    async fn open(&self, options: RelayOptions) -> Result<Arc<dyn RelaySession>, WalletRpcError> {
        lock(&self.opened).push(options.clone());
        if self.fail_open {
            return Err(WalletRpcError::user_rejected());
        }

        let chain_id = self.landing_chain.unwrap_or(options.chain_id);
        let wallet = MockWallet::new(chain_id)
            .with_accounts(self.accounts.clone())
            .with_known_chains(options.rpc.keys().copied())
            .shared();
        let session = Arc::new(MockRelaySession {
            wallet,
            reject_enable: self.reject_enable,
            disconnected: AtomicBool::new(false),
        });
        lock(&self.sessions).push(session.clone());
        Ok(session)
    }
}

/// A relay session backed by a [`MockWallet`].
pub struct MockRelaySession {
    wallet: Arc<MockWallet>,
    reject_enable: bool,
    disconnected: AtomicBool,
}

impl MockRelaySession {
    /// The remote wallet behind this session
    pub fn mock_wallet(&self) -> &Arc<MockWallet> {
        &self.wallet
    }

    /// Whether `disconnect` was called
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelaySession for MockRelaySession {
    fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.wallet.clone()
    }

    async fn enable(&self) -> Result<Vec<String>, WalletRpcError> {
        if self.reject_enable {
            return Err(WalletRpcError::user_rejected());
        }
        let raw = self
            .wallet
            .request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        serde_json::from_value(raw).map_err(|e| WalletRpcError::new(-32603, e.to_string()))
    }

    async fn disconnect(&self) -> Result<(), WalletRpcError> {
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            self.wallet.emit(WalletEvent::Disconnected);
        }
        Ok(())
    }
}
