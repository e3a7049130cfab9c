//! Cache configuration

use std::time::Duration;

/// How long cached entries count as fresh.
///
/// A stale entry is still served while a refetch is pending; it is only
/// refetched on the next read.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datagrid_lib::store::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_list_stale_time(Duration::from_secs(60))
///     .with_record_stale_time(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Stale time for collection lists.
    ///
    /// Default: 5 minutes
    pub list_stale_time: Duration,

    /// Stale time for single records.
    ///
    /// Default: 5 minutes
    pub record_stale_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_stale_time: Duration::from_secs(300),   // 5 minutes
            record_stale_time: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the list stale time.
    pub fn with_list_stale_time(mut self, stale_time: Duration) -> Self {
        self.list_stale_time = stale_time;
        self
    }

    /// Sets the record stale time.
    pub fn with_record_stale_time(mut self, stale_time: Duration) -> Self {
        self.record_stale_time = stale_time;
        self
    }

    /// Creates a config where every read goes to the backend.
    pub fn no_cache() -> Self {
        Self {
            list_stale_time: Duration::ZERO,
            record_stale_time: Duration::ZERO,
        }
    }
}
