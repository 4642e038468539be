//! Time-boxed reply cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{ChronoError, Result};

/// Default time-to-live for cached replies.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Map whose entries expire a fixed time after they were written.
///
/// Expired entries are evicted by [`get`](Self::get) on their own key, and
/// in bulk on every write and by [`purge_expired`](Self::purge_expired), so
/// a stream of distinct keys cannot grow the map past the live set.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    default_ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a cache whose entries live for `default_ttl` unless
    /// [`set_with_ttl`](Self::set_with_ttl) says otherwise.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The TTL applied by [`set`](Self::set).
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the value for `key` if it has not expired. An expired entry is
    /// removed. A poisoned lock reads as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        let (value, expiry) = entries.get(key)?;
        if Instant::now() < *expiry {
            return Some(value.clone());
        }
        entries.remove(key);
        None
    }

    /// Store `value` for the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ChronoError::Cache`] if the lock is poisoned.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Store `value` for `ttl`, dropping expired entries first.
    ///
    /// # Errors
    ///
    /// Returns [`ChronoError::Cache`] if the lock is poisoned.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| ChronoError::Cache(format!("ttl cache lock poisoned: {e}")))?;
        drop_expired(&mut entries, now);
        entries.insert(key, (value, now + ttl));
        Ok(())
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        drop_expired(&mut entries, Instant::now())
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
                    let _guard = self.entries.lock();
                    if !self.entries.is_poisoned() {
                        panic!("writer died holding the ttl cache lock");
                    }
                })
                .join();
            assert!(outcome.is_err());
        });
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn drop_expired<K, V>(entries: &mut HashMap<K, (V, Instant)>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, (_, expiry)| now < *expiry);
    before - entries.len()
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
