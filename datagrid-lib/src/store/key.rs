//! Hierarchical cache keys

use std::fmt;

/// Identifies a cached list or record as a path of segments.
///
/// A base key like `["users"]` owns every key that extends it, such as the
/// per-tab list `["users", "admin"]` or a record `["users", "admin", "42"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns a new key with one more segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns `true` if `prefix` is this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns the key segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for CacheKey {
    fn from(segment: &str) -> Self {
        Self::new([segment])
    }
}

impl From<Vec<String>> for CacheKey {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}
