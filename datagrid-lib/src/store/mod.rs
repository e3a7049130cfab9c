//! Remote collection store
//!
//! Fetches, caches and mutates one record collection through a [`Backend`].
//! Mutations are applied to the cached list before the backend answers, rolled
//! back to a snapshot when it fails, and always end by invalidating the
//! collection's lists so the next read reconciles with the server.

mod cache;
mod config;
mod key;

pub use cache::*;
pub use config::*;
pub use key::*;

use std::sync::Arc;

use chrono::Utc;

use crate::api::Backend;
use crate::api::ResolvedQuery;
use crate::error::Error;
use crate::model::EntityId;
use crate::model::Record;
use crate::response::Response;

/// Fetch/cache/mutate access to one collection.
///
/// Cheap to clone. Stores created from the same [`CollectionCache`] see each
/// other's data.
///
/// # Example
///
/// ```ignore
/// let cache = Arc::new(CollectionCache::default());
/// let store = CollectionStore::new(Arc::new(client), cache, "/users", CacheKey::from("users"));
///
/// let users = store.list_all().await?.into_inner();
/// let created = store.create(Record::new().set("name", "Ann")).await?;
/// ```
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn Backend>,
    cache: Arc<CollectionCache>,
    path: String,
    list_path: String,
    base_key: CacheKey,
    key: CacheKey,
}

impl CollectionStore {
    /// Creates a store for the collection at `path`, cached under `base_key`.
    pub fn new(
        backend: Arc<dyn Backend>,
        cache: Arc<CollectionCache>,
        path: impl Into<String>,
        base_key: impl Into<CacheKey>,
    ) -> Self {
        let path = path.into();
        let base_key = base_key.into();
        Self {
            backend,
            cache,
            list_path: path.clone(),
            path,
            key: base_key.clone(),
            base_key,
        }
    }

    /// Returns a store for a resolved query: same collection, with the query's
    /// parameters on list requests and its cache key for the list.
    pub fn scoped(&self, query: &ResolvedQuery) -> Self {
        Self {
            backend: self.backend.clone(),
            cache: self.cache.clone(),
            path: query.path.clone(),
            list_path: query.list_path(),
            base_key: self.base_key.clone(),
            key: query.cache_key.clone(),
        }
    }

    /// The collection path, without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The cache key of the list this store reads.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// The key every list and record of this collection lives under.
    pub fn base_key(&self) -> &CacheKey {
        &self.base_key
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<CollectionCache> {
        &self.cache
    }

    /// The cache key of a single record.
    pub fn record_key(&self, id: &EntityId) -> CacheKey {
        self.base_key.child(id.to_string())
    }

    /// The list currently cached under this store's key, without fetching.
    pub fn cached(&self) -> Option<Vec<Record>> {
        self.cache.list(&self.key).map(|entry| entry.data)
    }

    /// Marks every list and record of this collection for refetch.
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.base_key);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the list, from cache while it is fresh.
    pub async fn list_all(&self) -> Result<Response<Vec<Record>>, Error> {
        if self.cache.is_list_fresh(&self.key) {
            if let Some(entry) = self.cache.list(&self.key) {
                log::debug!("Cache hit for {}", self.key);
                return Ok(Response::cache_hit(entry.data, entry.fetched_at, false));
            }
        }
        self.fetch_list().await
    }

    /// Fetches the list from the backend regardless of freshness.
    pub async fn refetch(&self) -> Result<Response<Vec<Record>>, Error> {
        self.fetch_list().await
    }

    async fn fetch_list(&self) -> Result<Response<Vec<Record>>, Error> {
        let token = self.cache.fetch_token(&self.key);
        log::debug!("Fetching {} for {}", self.list_path, self.key);

        let records = tokio::select! {
            _ = token.cancelled() => None,
            result = self.backend.list(&self.list_path) => Some(result?),
        };

        if let Some(records) = records {
            if self.cache.finish_fetch(&self.key, &token, records.clone()) {
                return Ok(Response::cache_miss(records, Utc::now()));
            }
        }

        log::debug!("Fetch for {} was cancelled", self.key);
        match self.cache.list(&self.key) {
            Some(entry) => Ok(Response::cache_hit(entry.data, entry.fetched_at, true)),
            None => Err(Error::Cancelled),
        }
    }

    /// Returns one record, from cache while it is fresh.
    pub async fn get_one(&self, id: &EntityId) -> Result<Response<Record>, Error> {
        let key = self.record_key(id);
        if self.cache.is_record_fresh(&key) {
            if let Some(entry) = self.cache.record(&key) {
                log::debug!("Cache hit for {}", key);
                return Ok(Response::cache_hit(entry.data, entry.fetched_at, false));
            }
        }

        let record = self.backend.get(&self.path, id).await?;
        self.cache.set_record(key, record.clone());
        Ok(Response::cache_miss(record, Utc::now()))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a record from attributes without an id.
    ///
    /// A placeholder with a temporary id is appended to the cached list before
    /// the request is sent. It is removed again if the backend fails; on success
    /// the list is refetched on the next read.
    pub async fn create(&self, attrs: Record) -> Result<Record, Error> {
        if attrs.id().is_some() {
            return Err(Error::InvalidOperation(
                "Records to create must not carry an id".to_string(),
            ));
        }

        self.cache.cancel_fetches(&self.key);
        let snapshot = self.cache.snapshot(&self.key, None);

        let placeholder = attrs.clone().with_id(&EntityId::temporary());
        self.cache.update_list(&self.key, |list| list.push(placeholder));

        let result = self.backend.create(&self.path, &attrs).await;
        if let Err(e) = &result {
            log::warn!("Create on {} failed, rolling back: {}", self.key, e);
            self.cache.restore(snapshot);
        }

        self.cache.invalidate_lists(&self.base_key);
        result
    }

    /// Updates a record from partial attributes carrying its id.
    ///
    /// The attributes are merged into the cached list entry and the cached
    /// record before the request is sent, and rolled back if it fails.
    pub async fn update(&self, partial: Record) -> Result<Record, Error> {
        let id = partial
            .id()
            .ok_or_else(|| Error::InvalidOperation("Cannot update a record without an id".to_string()))?;
        let record_key = self.record_key(&id);

        self.cache.cancel_fetches(&self.key);
        let snapshot = self.cache.snapshot(&self.key, Some(&record_key));

        self.cache.update_list(&self.key, |list| {
            for record in list.iter_mut().filter(|r| r.has_id(&id)) {
                record.merge(&partial);
            }
        });
        self.cache.update_record(&record_key, |record| record.merge(&partial));

        let result = self.backend.update(&self.path, &partial).await;
        match &result {
            Ok(_) => {
                self.cache.invalidate_records(&record_key);
            }
            Err(e) => {
                log::warn!("Update of {} on {} failed, rolling back: {}", id, self.key, e);
                self.cache.restore(snapshot);
            }
        }

        self.cache.invalidate_lists(&self.base_key);
        result
    }

    /// Deletes a record by id.
    ///
    /// The record leaves the cached list and its cached entry is evicted
    /// before the request is sent; both come back if it fails.
    pub async fn delete_one(&self, id: &EntityId) -> Result<(), Error> {
        let record_key = self.record_key(id);

        self.cache.cancel_fetches(&self.key);
        let snapshot = self.cache.snapshot(&self.key, Some(&record_key));

        self.cache.update_list(&self.key, |list| list.retain(|r| !r.has_id(id)));
        self.cache.evict_record(&record_key);

        let result = self.backend.delete(&self.path, id).await;
        if let Err(e) = &result {
            log::warn!("Delete of {} on {} failed, rolling back: {}", id, self.key, e);
            self.cache.restore(snapshot);
        }

        self.cache.invalidate_lists(&self.base_key);
        result
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("path", &self.path)
            .field("list_path", &self.list_path)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
