//! TTL cache for derived read calls.
//!
//! Entries are keyed by chain as well as token and account, so switching
//! networks never serves another chain's data.

use crate::error::{Erc20Error, Result};
use alloy::primitives::Address;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default time an entry stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(15);

/// Identifies one read call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Function signature, e.g. `balanceOf(address)`
    pub query: &'static str,
    pub chain_id: u64,
    pub token: Address,
    pub owner: Option<Address>,
    pub spender: Option<Address>,
}

impl QueryKey {
    pub fn new(query: &'static str, chain_id: u64, token: Address) -> Self {
        Self {
            query,
            chain_id,
            token,
            owner: None,
            spender: None,
        }
    }

    pub fn owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn spender(mut self, spender: Address) -> Self {
        self.spender = Some(spender);
        self
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    stored_at: Instant,
}

/// Shared cache of read-call results.
///
/// Values are stored as JSON so one cache holds strings, decimals and
/// amounts alike. Failed fetches are never stored.
#[derive(Debug)]
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached value for `key` if it is still fresh
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let (value, fresh) = {
            let entry = self.entries.get(key)?;
            (entry.value.clone(), entry.stored_at.elapsed() < self.ttl)
        };
        if !fresh {
            self.entries
                .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Erc20Error::Decode {
            query: key.query,
            reason: e.to_string(),
        })?;
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Returns the fresh entry for `key`, or runs `fetch` and stores its
    /// result.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(&key) {
            debug!(query = key.query, chain_id = key.chain_id, "Query cache hit");
            return Ok(value);
        }
        debug!(query = key.query, chain_id = key.chain_id, "Query cache miss");
        let value = fetch().await?;
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Drops every entry for `chain_id`
    pub fn invalidate_chain(&self, chain_id: u64) {
        self.entries.retain(|key, _| key.chain_id != chain_id);
    }

    /// Drops expired entries
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
