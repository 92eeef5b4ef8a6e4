//! Scripted EIP-1193 wallet.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use web3sdk_provider::{
    parse_chain_id, to_hex_chain_id, ListenerId, WalletEvent, WalletListener, WalletProvider,
    WalletRpcError,
};

/// A request the wallet received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// RPC method
    pub method: String,
    /// Parameters as sent
    pub params: Value,
}

#[derive(Debug, Clone)]
struct Script {
    accounts: Vec<String>,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    reject_accounts: bool,
    reject_add: bool,
    switch_error: Option<WalletRpcError>,
    switches_on_add: bool,
}

/// Wallet that answers requests from a script and records every call.
///
/// Supports `eth_requestAccounts`, `eth_accounts`, `eth_chainId`,
/// `wallet_switchEthereumChain` and `wallet_addEthereumChain`; anything else
/// answers with JSON-RPC "method not found".
pub struct MockWallet {
    script: Mutex<Script>,
    listeners: Mutex<Vec<(ListenerId, WalletListener)>>,
    next_listener: AtomicU64,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockWallet {
    /// Wallet on `chain_id`, knowing only that chain, with no accounts
    pub fn new(chain_id: u64) -> Self {
        Self {
            script: Mutex::new(Script {
                accounts: Vec::new(),
                chain_id,
                known_chains: BTreeSet::from([chain_id]),
                reject_accounts: false,
                reject_add: false,
                switch_error: None,
                switches_on_add: false,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Accounts returned by `eth_requestAccounts`
    pub fn with_accounts<I, S>(self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.script).accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Chains the wallet can switch to without registering them first
    pub fn with_known_chains(self, chains: impl IntoIterator<Item = u64>) -> Self {
        lock(&self.script).known_chains.extend(chains);
        self
    }

    /// The user rejects `eth_requestAccounts`
    pub fn rejecting_accounts(self) -> Self {
        lock(&self.script).reject_accounts = true;
        self
    }

    /// The user rejects `wallet_addEthereumChain`
    pub fn rejecting_chain_add(self) -> Self {
        lock(&self.script).reject_add = true;
        self
    }

    /// Every `wallet_switchEthereumChain` fails with `error`
    pub fn failing_switch(self, error: WalletRpcError) -> Self {
        lock(&self.script).switch_error = Some(error);
        self
    }

    /// `wallet_addEthereumChain` also switches, like most extensions do
    pub fn switching_on_add(self) -> Self {
        lock(&self.script).switches_on_add = true;
        self
    }

    /// Wraps the wallet for sharing with an environment
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Chain the wallet is currently on
    pub fn chain_id(&self) -> u64 {
        lock(&self.script).chain_id
    }

    /// Whether the wallet knows `chain_id`
    pub fn knows_chain(&self, chain_id: u64) -> bool {
        lock(&self.script).known_chains.contains(&chain_id)
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Recorded method names, in order
    pub fn methods(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.method.clone()).collect()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Simulates the user picking other accounts in the wallet UI
    pub fn set_accounts<I, S>(&self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accounts: Vec<String> = accounts.into_iter().map(Into::into).collect();
        lock(&self.script).accounts = accounts.clone();
        self.emit(WalletEvent::AccountsChanged(accounts));
    }

    /// Simulates the user switching chains in the wallet UI
    pub fn set_chain(&self, chain_id: u64) {
        {
            let mut script = lock(&self.script);
            script.chain_id = chain_id;
            script.known_chains.insert(chain_id);
        }
        self.emit(WalletEvent::ChainChanged(chain_id));
    }

    /// Delivers `event` to every listener
    pub fn emit(&self, event: WalletEvent) {
        let listeners: Vec<WalletListener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    fn requested_chain(params: &Value) -> Result<u64, WalletRpcError> {
        params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .ok_or_else(|| WalletRpcError::new(-32602, "missing chainId"))
            .and_then(|raw| {
                parse_chain_id(raw).map_err(|e| WalletRpcError::new(-32602, e.to_string()))
            })
    }

    fn switch(&self, params: &Value) -> Result<Value, WalletRpcError> {
        let chain_id = Self::requested_chain(params)?;
        {
            let mut script = lock(&self.script);
            if let Some(err) = script.switch_error.clone() {
                return Err(err);
            }
            if !script.known_chains.contains(&chain_id) {
                return Err(WalletRpcError::unrecognized_chain(&to_hex_chain_id(chain_id)));
            }
            if script.chain_id == chain_id {
                return Ok(Value::Null);
            }
            script.chain_id = chain_id;
        }
        self.emit(WalletEvent::ChainChanged(chain_id));
        Ok(Value::Null)
    }

    fn add_chain(&self, params: &Value) -> Result<Value, WalletRpcError> {
        let chain_id = Self::requested_chain(params)?;
        let switched = {
            let mut script = lock(&self.script);
            if script.reject_add {
                return Err(WalletRpcError::user_rejected());
            }
            script.known_chains.insert(chain_id);
            if script.switches_on_add && script.chain_id != chain_id {
                script.chain_id = chain_id;
                true
            } else {
                false
            }
        };
        if switched {
            self.emit(WalletEvent::ChainChanged(chain_id));
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletRpcError> {
        lock(&self.calls).push(RecordedCall {
            method: method.to_string(),
            params: params.clone(),
        });

        match method {
            "eth_requestAccounts" => {
                let script = lock(&self.script);
                if script.reject_accounts {
                    return Err(WalletRpcError::user_rejected());
                }
                Ok(json!(script.accounts))
            }
            "eth_accounts" => Ok(json!(lock(&self.script).accounts)),
            "eth_chainId" => Ok(json!(to_hex_chain_id(lock(&self.script).chain_id))),
            "wallet_switchEthereumChain" => self.switch(&params),
            "wallet_addEthereumChain" => self.add_chain(&params),
            other => Err(WalletRpcError::new(
                -32601,
                format!("method {other} not found"),
            )),
        }
    }

    fn subscribe(&self, listener: WalletListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        lock(&self.listeners).retain(|(registered, _)| *registered != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accounts_and_chain() {
        let wallet = MockWallet::new(1).with_accounts(["0xabc"]);
        let accounts = wallet.request("eth_requestAccounts", json!([])).await.unwrap();
        assert_eq!(accounts, json!(["0xabc"]));
        let chain = wallet.request("eth_chainId", json!([])).await.unwrap();
        assert_eq!(chain, json!("0x1"));
        assert_eq!(wallet.methods(), vec!["eth_requestAccounts", "eth_chainId"]);
    }

    #[tokio::test]
    async fn test_switch_to_unknown_chain_fails_with_4902() {
        let wallet = MockWallet::new(1);
        let err = wallet
            .request("wallet_switchEthereumChain", json!([{ "chainId": "0x89" }]))
            .await
            .unwrap_err();
        assert_eq!(err.code, 4902);
        assert_eq!(wallet.chain_id(), 1);
    }

    #[tokio::test]
    async fn test_add_then_switch() {
        let wallet = MockWallet::new(1);
        wallet
            .request("wallet_addEthereumChain", json!([{ "chainId": "0x89" }]))
            .await
            .unwrap();
        assert!(wallet.knows_chain(137));
        wallet
            .request("wallet_switchEthereumChain", json!([{ "chainId": "0x89" }]))
            .await
            .unwrap();
        assert_eq!(wallet.chain_id(), 137);
    }

    #[test]
    fn test_emit_reaches_listeners() {
        let wallet = MockWallet::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = wallet.subscribe(Arc::new(move |event: WalletEvent| lock(&sink).push(event)));

        wallet.set_chain(56);
        wallet.set_accounts(Vec::<String>::new());

        assert_eq!(
            *lock(&seen),
            vec![
                WalletEvent::ChainChanged(56),
                WalletEvent::AccountsChanged(vec![])
            ]
        );

        wallet.unsubscribe(id);
        assert_eq!(wallet.listener_count(), 0);
        wallet.set_chain(1);
        assert_eq!(lock(&seen).len(), 2);
    }
}
