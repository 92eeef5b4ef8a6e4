//! Persisted connection preferences.
//!
//! Two keys survive between sessions:
//! - `connector-cache`: name of the last connector that connected
//! - `chain-id-cache`: last confirmed chain id, as a decimal string
//!
//! Backends:
//! - Web: `localStorage` ([`LocalStorageStore`])
//! - Desktop: a JSON map in the platform config directory ([`FileStore`])
//! - Tests and headless use: [`MemoryStore`]

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use web3sdk_error::{ConnectError, Result};
use web3sdk_provider::parse_chain_id;

pub const CONNECTOR_CACHE_KEY: &str = "connector-cache";
pub const CHAIN_ID_CACHE_KEY: &str = "chain-id-cache";

/// String key/value storage that outlives a session.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn poisoned<T>(_: T) -> ConnectError {
    ConnectError::Storage("preference store lock poisoned".to_string())
}

/// In-process store; nothing persists past the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// JSON map on disk, rewritten on every change.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    lock: std::sync::Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: std::sync::Mutex::new(()),
        }
    }

    /// `preferences.json` in the platform config directory:
    /// - Linux: `~/.config/web3sdk/`
    /// - macOS: `~/Library/Application Support/web3sdk/`
    /// - Windows: `%APPDATA%\web3sdk\`
    pub fn in_config_dir() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ConnectError::Storage("no platform config directory".to_string()))?;
        Ok(Self::new(dir.join("web3sdk").join("preferences.json")))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous map intact.
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut map = match self.read_map() {
            Err(ConnectError::Format(reason)) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "Discarding unreadable preferences file"
                );
                BTreeMap::new()
            }
            other => other?,
        };
        f(&mut map);
        self.write_map(&map)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

/// Browser `localStorage`. Outside a window every read is empty and every
/// write is dropped.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl PreferenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(storage) = Self::storage() else {
            return Ok(None);
        };
        storage
            .get_item(key)
            .map_err(|e| ConnectError::Storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(storage) = Self::storage() else {
            return Ok(());
        };
        storage
            .set_item(key, value)
            .map_err(|e| ConnectError::Storage(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let Some(storage) = Self::storage() else {
            return Ok(());
        };
        storage
            .remove_item(key)
            .map_err(|e| ConnectError::Storage(format!("{e:?}")))
    }
}

/// Typed access to the two cached preferences.
///
/// Storage failures are logged and otherwise ignored: a broken store must not
/// break connecting.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read preference");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "Failed to persist preference");
        }
    }

    fn clear(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key, error = %e, "Failed to remove preference");
        }
    }

    pub fn cached_connector(&self) -> Option<String> {
        self.read(CONNECTOR_CACHE_KEY)
    }

    pub fn set_connector(&self, name: &str) {
        debug!(connector = name, "Caching connector");
        self.write(CONNECTOR_CACHE_KEY, name);
    }

    pub fn clear_connector(&self) {
        self.clear(CONNECTOR_CACHE_KEY);
    }

    /// Last cached chain id; unparsable values count as absent.
    pub fn cached_chain_id(&self) -> Option<u64> {
        let raw = self.read(CHAIN_ID_CACHE_KEY)?;
        match parse_chain_id(&Value::String(raw.clone())) {
            Ok(chain_id) => Some(chain_id),
            Err(_) => {
                debug!(value = %raw, "Ignoring unparsable cached chain id");
                None
            }
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.write(CHAIN_ID_CACHE_KEY, &chain_id.to_string());
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(ConnectError::Storage("quota exceeded".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ConnectError::Storage("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(ConnectError::Storage("quota exceeded".into()))
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let store = FileStore::new(&path);
        assert_eq!(store.get(CONNECTOR_CACHE_KEY).unwrap(), None);
        store.set(CONNECTOR_CACHE_KEY, "MetaMaskConnector").unwrap();
        store.set(CHAIN_ID_CACHE_KEY, "137").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(CONNECTOR_CACHE_KEY).unwrap().as_deref(),
            Some("MetaMaskConnector")
        );
        reopened.remove(CONNECTOR_CACHE_KEY).unwrap();
        assert_eq!(store.get(CONNECTOR_CACHE_KEY).unwrap(), None);
        assert_eq!(store.get(CHAIN_ID_CACHE_KEY).unwrap().as_deref(), Some("137"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileStore::new(&path).get(CONNECTOR_CACHE_KEY).is_err());
    }

    #[test]
    fn test_file_store_recovers_from_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"connector-cache": "MetaMaskConn"#).unwrap();

        let store = FileStore::new(&path);
        store.set(CONNECTOR_CACHE_KEY, "NetworkConnector").unwrap();
        assert_eq!(
            store.get(CONNECTOR_CACHE_KEY).unwrap().as_deref(),
            Some("NetworkConnector")
        );

        std::fs::write(&path, "").unwrap();
        store.remove(CHAIN_ID_CACHE_KEY).unwrap();
        assert_eq!(store.get(CONNECTOR_CACHE_KEY).unwrap(), None);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("preferences.json")]);
    }

    #[test]
    fn test_preferences_chain_id() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.cached_chain_id(), None);
        prefs.set_chain_id(137);
        assert_eq!(prefs.cached_chain_id(), Some(137));
        assert_eq!(
            prefs.store().get(CHAIN_ID_CACHE_KEY).unwrap().as_deref(),
            Some("137")
        );
    }

    #[test]
    fn test_unparsable_chain_id_is_absent() {
        for raw in ["", "abc", "-1", "0xzz", "1.5", "137 matic"] {
            let prefs = Preferences::new(Arc::new(MemoryStore::with_entries([(
                CHAIN_ID_CACHE_KEY,
                raw,
            )])));
            assert_eq!(prefs.cached_chain_id(), None, "value {raw:?}");
        }
    }

    #[test]
    fn test_broken_store_is_tolerated() {
        let prefs = Preferences::new(Arc::new(BrokenStore));
        prefs.set_connector("MetaMaskConnector");
        prefs.clear_connector();
        assert_eq!(prefs.cached_connector(), None);
        assert_eq!(prefs.cached_chain_id(), None);
    }
}
