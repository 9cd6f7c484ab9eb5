//! In-memory window store shared by every limiter and the janitor.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

/// One caller's current accounting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    /// Composite key, namespaced by limiter kind
    pub key: String,
    /// Accepted operations counted in this window
    pub count: u64,
    /// Epoch milliseconds at which the window ends
    pub reset_at: u64,
}

impl WindowRecord {
    /// A fresh, empty window ending at `reset_at`.
    pub fn new(key: impl Into<String>, reset_at: u64) -> Self {
        Self {
            key: key.into(),
            count: 0,
            reset_at,
        }
    }

    /// Whether the window has ended at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.reset_at < now
    }
}

/// Concurrent `key -> WindowRecord` map.
///
/// Every check touches exactly one key. [`WindowStore::update`] runs the
/// whole read-compare-write sequence while holding that key's shard lock,
/// so two checks against the same key are always serialized.
#[derive(Debug, Default)]
pub struct WindowStore {
    records: DashMap<String, WindowRecord>,
}

impl WindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the record stored under `key`.
    pub fn get(&self, key: &str) -> Option<WindowRecord> {
        self.records.get(key).map(|r| r.value().clone())
    }

    /// Insert or overwrite the record for `key`.
    pub fn put(&self, key: impl Into<String>, record: WindowRecord) {
        self.records.insert(key.into(), record);
    }

    /// Atomically read-modify-write the record for `key`.
    ///
    /// `f` receives the current record, or `None` if absent, and returns the
    /// record to store (or `None` to leave the store untouched) together with
    /// a value handed back to the caller. No other update or sweep can
    /// observe the key while `f` runs.
    pub fn update<F, T>(&self, key: &str, f: F) -> T
    where
        F: FnOnce(Option<&WindowRecord>) -> (Option<WindowRecord>, T),
    {
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let (next, out) = f(Some(occupied.get()));
                if let Some(record) = next {
                    occupied.insert(record);
                }
                out
            }
            Entry::Vacant(vacant) => {
                let (next, out) = f(None);
                if let Some(record) = next {
                    vacant.insert(record);
                }
                out
            }
        }
    }

    /// Remove the record for `key`, returning it if present.
    pub fn remove(&self, key: &str) -> Option<WindowRecord> {
        self.records.remove(key).map(|(_, record)| record)
    }

    /// Evict every record whose window ended before `now`.
    ///
    /// Returns the number of evicted records.
    pub fn sweep(&self, now: u64) -> usize {
        let mut evicted = 0;
        self.records.retain(|_, record| {
            let keep = !record.is_expired(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        trace!(evicted, remaining = self.records.len(), "Swept window store");
        evicted
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.clear();
    }
}
