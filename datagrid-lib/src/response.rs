//! Response wrapper with cache status

use chrono::DateTime;
use chrono::Utc;

/// A store read together with where its data came from.
///
/// List and single-record reads return this wrapper so callers can tell a
/// fresh fetch from a cached answer, and whether that answer was stale.
///
/// # Example
///
/// ```ignore
/// let response = store.list_all().await?;
///
/// if response.is_cached() {
///     println!("Data from cache, fetched at {:?}", response.fetched_at());
/// }
///
/// let records = response.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Information about whether this response came from cache.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a new response with no cache involvement.
    pub fn new(data: T) -> Self {
        Self {
            data,
            cache: CacheStatus::None,
        }
    }

    /// Creates a response for data that was just fetched and stored.
    pub fn cache_miss(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss { fetched_at },
        }
    }

    /// Creates a response answered from the cache.
    pub fn cache_hit(data: T, fetched_at: DateTime<Utc>, stale: bool) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit { fetched_at, stale },
        }
    }

    /// Returns `true` if this response came from the cache.
    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// Returns `true` if this was a fresh fetch (cache miss or cache disabled).
    pub fn is_fresh(&self) -> bool {
        !self.is_cached()
    }

    /// Returns `true` if a cached answer was past its stale time or invalidated.
    pub fn is_stale(&self) -> bool {
        matches!(self.cache, CacheStatus::Hit { stale: true, .. })
    }

    /// Returns when the data was fetched from the backend, if known.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        match &self.cache {
            CacheStatus::None => None,
            CacheStatus::Miss { fetched_at } | CacheStatus::Hit { fetched_at, .. } => Some(*fetched_at),
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            cache: self.cache,
        }
    }
}

/// Cache status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache was not involved.
    None,
    /// Data was freshly fetched and is now cached.
    Miss {
        /// When the data was fetched.
        fetched_at: DateTime<Utc>,
    },
    /// Data was returned from the cache.
    Hit {
        /// When the cached data was fetched.
        fetched_at: DateTime<Utc>,
        /// The entry was past its stale time or invalidated.
        stale: bool,
    },
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Returns `true` if caching was not involved.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
