//! Shared list and record cache with snapshots and fetch cancellation

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::CacheConfig;
use super::CacheKey;
use crate::model::Record;

/// A cached value and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached data.
    pub data: T,
    /// When the data was last written from a backend response.
    pub fetched_at: DateTime<Utc>,
    /// Set by invalidation; the next read refetches.
    pub invalidated: bool,
}

impl<T> CacheEntry<T> {
    fn fresh(data: T) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
            invalidated: false,
        }
    }

    /// Returns `true` if the entry was invalidated or is older than `stale_time`.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        if self.invalidated {
            return true;
        }
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age.to_std().map(|age| age >= stale_time).unwrap_or(false)
    }
}

/// The state of some cache entries at one moment, for rollback.
#[derive(Debug, Clone)]
pub struct Snapshot {
    list_key: CacheKey,
    list: Option<CacheEntry<Vec<Record>>>,
    record: Option<(CacheKey, Option<CacheEntry<Record>>)>,
}

impl Snapshot {
    /// The list captured in this snapshot, if one was cached.
    pub fn list(&self) -> Option<&[Record]> {
        self.list.as_ref().map(|entry| entry.data.as_slice())
    }
}

/// Process-wide cache of collection lists and single records.
///
/// Entries are addressed by [`CacheKey`]. Lists and records live in separate
/// maps, so a list key and a record key never collide. Share one instance
/// between every store that should see the same data.
#[derive(Debug, Default)]
pub struct CollectionCache {
    config: CacheConfig,
    lists: DashMap<CacheKey, CacheEntry<Vec<Record>>>,
    records: DashMap<CacheKey, CacheEntry<Record>>,
    fetches: DashMap<CacheKey, CancellationToken>,
}

impl CollectionCache {
    /// Creates an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            lists: DashMap::new(),
            records: DashMap::new(),
            fetches: DashMap::new(),
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Returns the cached list for a key.
    pub fn list(&self, key: &CacheKey) -> Option<CacheEntry<Vec<Record>>> {
        self.lists.get(key).map(|entry| entry.value().clone())
    }

    /// Returns `true` if the list is cached and neither stale nor invalidated.
    pub fn is_list_fresh(&self, key: &CacheKey) -> bool {
        self.lists
            .get(key)
            .is_some_and(|entry| !entry.is_stale(self.config.list_stale_time))
    }

    /// Stores a freshly fetched list.
    pub fn set_list(&self, key: CacheKey, records: Vec<Record>) {
        self.lists.insert(key, CacheEntry::fresh(records));
    }

    /// Edits a cached list in place. Returns `false` if nothing is cached.
    pub fn update_list(&self, key: &CacheKey, f: impl FnOnce(&mut Vec<Record>)) -> bool {
        match self.lists.get_mut(key) {
            Some(mut entry) => {
                f(&mut entry.data);
                true
            }
            None => false,
        }
    }

    /// Marks every list under `prefix` as invalidated. Returns how many were marked.
    pub fn invalidate_lists(&self, prefix: &CacheKey) -> usize {
        let mut count = 0;
        for mut entry in self.lists.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        log::debug!("Invalidated {} list(s) under {}", count, prefix);
        count
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Returns the cached record for a key.
    pub fn record(&self, key: &CacheKey) -> Option<CacheEntry<Record>> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    /// Returns `true` if the record is cached and neither stale nor invalidated.
    pub fn is_record_fresh(&self, key: &CacheKey) -> bool {
        self.records
            .get(key)
            .is_some_and(|entry| !entry.is_stale(self.config.record_stale_time))
    }

    /// Stores a freshly fetched record.
    pub fn set_record(&self, key: CacheKey, record: Record) {
        self.records.insert(key, CacheEntry::fresh(record));
    }

    /// Edits a cached record in place. Returns `false` if nothing is cached.
    pub fn update_record(&self, key: &CacheKey, f: impl FnOnce(&mut Record)) -> bool {
        match self.records.get_mut(key) {
            Some(mut entry) => {
                f(&mut entry.data);
                true
            }
            None => false,
        }
    }

    /// Removes a cached record.
    pub fn evict_record(&self, key: &CacheKey) {
        self.records.remove(key);
    }

    /// Marks every record under `prefix` as invalidated. Returns how many were marked.
    pub fn invalidate_records(&self, prefix: &CacheKey) -> usize {
        let mut count = 0;
        for mut entry in self.records.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        count
    }

    /// Invalidates every list and record under `prefix`.
    pub fn invalidate(&self, prefix: &CacheKey) -> usize {
        self.invalidate_lists(prefix) + self.invalidate_records(prefix)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures a list entry, and optionally a record entry, for rollback.
    pub fn snapshot(&self, list_key: &CacheKey, record_key: Option<&CacheKey>) -> Snapshot {
        Snapshot {
            list_key: list_key.clone(),
            list: self.list(list_key),
            record: record_key.map(|key| (key.clone(), self.record(key))),
        }
    }

    /// Puts back exactly the entries captured in `snapshot`.
    pub fn restore(&self, snapshot: Snapshot) {
        match snapshot.list {
            Some(entry) => {
                self.lists.insert(snapshot.list_key, entry);
            }
            None => {
                self.lists.remove(&snapshot.list_key);
            }
        }

        if let Some((key, record)) = snapshot.record {
            match record {
                Some(entry) => {
                    self.records.insert(key, entry);
                }
                None => {
                    self.records.remove(&key);
                }
            }
        }
    }

    // =========================================================================
    // In-flight fetches
    // =========================================================================

    /// Returns the cancellation token for fetches of `key`.
    ///
    /// Fetches started before the next [`cancel_fetches`](Self::cancel_fetches)
    /// for this key share the token.
    pub fn fetch_token(&self, key: &CacheKey) -> CancellationToken {
        self.fetches.entry(key.clone()).or_default().clone()
    }

    /// Stores a fetched list unless its fetch was cancelled.
    ///
    /// Returns `false` and leaves the cache untouched if `token` was cancelled.
    pub fn finish_fetch(&self, key: &CacheKey, token: &CancellationToken, records: Vec<Record>) -> bool {
        let entry = self.lists.entry(key.clone());
        if token.is_cancelled() {
            return false;
        }
        entry.insert(CacheEntry::fresh(records));
        true
    }

    /// Cancels in-flight fetches under `prefix`. Returns how many keys were cancelled.
    pub fn cancel_fetches(&self, prefix: &CacheKey) -> usize {
        let keys: Vec<CacheKey> = self
            .fetches
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        for key in &keys {
            if let Some((_, token)) = self.fetches.remove(key) {
                token.cancel();
            }
        }

        if !keys.is_empty() {
            log::debug!("Cancelled fetches for {} key(s) under {}", keys.len(), prefix);
        }
        keys.len()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lists.clear();
        self.records.clear();
    }
}
