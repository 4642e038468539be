//! Bounded least-recently-used cache.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::error::{ChronoError, Result};

/// Default number of entries kept by [`RecencyCache`].
pub const DEFAULT_CAPACITY: usize = 256;

/// Fixed-capacity map that evicts the least-recently-used entry.
///
/// Both [`get`](Self::get) and [`set`](Self::set) promote the key to
/// most-recently-used.
pub struct RecencyCache<K: Hash + Eq, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> RecencyCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the value for `key`, promoting it. A poisoned lock reads as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    /// Insert or replace `key`, evicting the oldest entry when full.
    ///
    /// # Errors
    ///
    /// Returns [`ChronoError::Cache`] if the lock is poisoned.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ChronoError::Cache(format!("recency cache lock poisoned: {e}")))?;
        inner.put(key, value);
        Ok(())
    }

    /// Whether `key` is present, without promoting it.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().map(|c| c.contains(key)).unwrap_or(false)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().map(|c| c.cap().get()).unwrap_or(0)
    }

    /// Leave the lock poisoned, as a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison(&self)
    where
        K: Send,
        V: Send,
    {
        std::thread::scope(|s| {
            let outcome = s
                .spawn(|| {
                    let _guard = self.inner.lock();
                    if !self.inner.is_poisoned() {
                        panic!("writer died holding the recency cache lock");
                    }
                })
                .join();
            assert!(outcome.is_err());
        });
    }
}

impl<K: Hash + Eq, V: Clone> Default for RecencyCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
