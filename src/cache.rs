//! Compute-if-stale caches used to keep redraw-frequency lookups off the
//! network. Entries are overwritten in place when they expire; negative
//! results (no project root, app not installed) are cached like any other
//! value so repeated failing lookups stay bounded.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        Instant::now().saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Keyed cache where every entry shares one time-to-live.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached value for `key`, only while it is younger than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().expect("ttl cache lock");
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("ttl cache lock");
        entries.insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Return the fresh cached value for `key`, or run `compute` once and
    /// store its result before returning it. The compute result is stored
    /// even when it is a failure sentinel.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = compute(key.clone()).await;
        self.insert(key, value.clone());
        value
    }
}

/// Single-slot variant for unkeyed cache domains.
pub struct TtlCell<V> {
    ttl: Duration,
    slot: Mutex<Option<Entry<V>>>,
}

impl<V: Clone> TtlCell<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<V> {
        let slot = self.slot.lock().expect("ttl cell lock");
        slot.as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, value: V) {
        let mut slot = self.slot.lock().expect("ttl cell lock");
        *slot = Some(Entry {
            value,
            fetched_at: Instant::now(),
        });
    }

    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get() {
            return hit;
        }
        let value = compute().await;
        self.set(value.clone());
        value
    }
}
