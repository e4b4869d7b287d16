//! Per-key critical sections for read-then-write sequences

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes work that targets the same key, such as an email address or a
/// customer id.
///
/// Entries are dropped once nobody holds or waits on them.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            locks
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}
