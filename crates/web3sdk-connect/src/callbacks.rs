//! Single-subscriber callback slots.

use std::fmt;
use std::sync::{Arc, RwLock};
use web3sdk_provider::Network;

/// Callback stored in a [`CallbackSlot`].
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Holds at most one callback. Setting a new one replaces the old.
pub struct CallbackSlot<T> {
    slot: RwLock<Option<Callback<T>>>,
}

impl<T> CallbackSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn set(&self, callback: Callback<T>) {
        match self.slot.write() {
            Ok(mut slot) => *slot = Some(callback),
            Err(poisoned) => *poisoned.into_inner() = Some(callback),
        }
    }

    pub fn clear(&self) {
        match self.slot.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Callback<T>> {
        match self.slot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Calls the registered callback, if any. The lock is released first so
    /// the callback may replace itself.
    pub fn emit(&self, value: T) {
        if let Some(callback) = self.current() {
            callback(value);
        }
    }
}

impl<T> Default for CallbackSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CallbackSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

/// The three notifications a connector can raise.
#[derive(Debug, Default)]
pub struct ConnectorCallbacks {
    pub connection_changed: CallbackSlot<bool>,
    pub account_changed: CallbackSlot<String>,
    pub network_changed: CallbackSlot<Network>,
}

impl ConnectorCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.connection_changed.clear();
        self.account_changed.clear();
        self.network_changed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_slot_is_noop() {
        let slot: CallbackSlot<u64> = CallbackSlot::new();
        assert!(!slot.is_set());
        slot.emit(1);
    }

    #[test]
    fn test_set_replaces_previous() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let slot: CallbackSlot<usize> = CallbackSlot::new();

        let f = first.clone();
        slot.set(Arc::new(move |n: usize| {
            f.fetch_add(n, Ordering::SeqCst);
        }));
        slot.emit(1);

        let s = second.clone();
        slot.set(Arc::new(move |n: usize| {
            s.fetch_add(n, Ordering::SeqCst);
        }));
        slot.emit(5);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_callback_may_touch_its_slot() {
        let slot = Arc::new(CallbackSlot::<bool>::new());
        let inner = slot.clone();
        slot.set(Arc::new(move |_: bool| inner.clear()));
        slot.emit(true);
        assert!(!slot.is_set());
    }
}
