//! Tab-scoped query parameters and cache keys

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::store::CacheKey;

/// Query parameters appended to a list request.
///
/// Parameters are kept in key order so the same map always encodes to the
/// same query string. `null` values are dropped when encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a parameter.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns a parameter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns this map with `overlay` merged over it. Overlay values win.
    pub fn merged(&self, overlay: &QueryParams) -> QueryParams {
        let mut merged = self.clone();
        for (key, value) in &overlay.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Encodes the parameters as `application/x-www-form-urlencoded`.
    ///
    /// Arrays are joined with `,`. Nested objects are sent as JSON text.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            if let Some(text) = param_text(value) {
                serializer.append_pair(key, &text);
            }
        }
        serializer.finish()
    }
}

fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(param_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// Tabs
// =============================================================================

/// A named view over the collection with its own parameter overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    /// Identifier, also used as the cache key segment.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Icon name, if any.
    pub icon: Option<String>,
    /// Parameters merged over the base parameters while this tab is active.
    pub params: QueryParams,
}

impl Tab {
    /// Creates a tab without parameters.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            params: QueryParams::new(),
        }
    }

    /// Sets the icon.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the parameter overlay.
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }
}

/// Who owns the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabSelection {
    /// The grid owns it, starting at `default` or the first declared tab.
    Internal { default: Option<String> },
    /// The caller owns it and passes the active tab in.
    External(String),
}

impl TabSelection {
    /// Internal selection starting at the first declared tab.
    pub fn first() -> Self {
        Self::Internal { default: None }
    }
}

impl Default for TabSelection {
    fn default() -> Self {
        Self::first()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// The request and cache coordinates of one list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    /// Path of the collection, without query string.
    pub path: String,
    /// Encoded query string, empty when there are no parameters.
    pub query_string: String,
    /// Effective cache key, including the active tab.
    pub cache_key: CacheKey,
    /// The active tab, if tabs are configured.
    pub tab: Option<String>,
}

impl ResolvedQuery {
    /// The list request path, with the query string appended.
    pub fn list_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}

/// Builds list requests and cache keys from base parameters and the active tab.
///
/// # Example
///
/// ```ignore
/// let resolver = QueryResolver::new("/users", CacheKey::from("users"))
///     .with_params(QueryParams::new().with("active", true))
///     .with_tabs(vec![
///         Tab::new("all", "All"),
///         Tab::new("admin", "Admins").params(QueryParams::new().with("role", "admin")),
///     ]);
///
/// let query = resolver.resolve(Some("admin"));
/// assert_eq!(query.list_path(), "/users?active=true&role=admin");
/// ```
#[derive(Debug, Clone)]
pub struct QueryResolver {
    path: String,
    base_key: CacheKey,
    base_params: QueryParams,
    tabs: Vec<Tab>,
}

impl QueryResolver {
    /// Creates a resolver for a collection path and base cache key.
    pub fn new(path: impl Into<String>, base_key: impl Into<CacheKey>) -> Self {
        Self {
            path: path.into(),
            base_key: base_key.into(),
            base_params: QueryParams::new(),
            tabs: Vec::new(),
        }
    }

    /// Sets the base parameters.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.base_params = params;
        self
    }

    /// Declares the tabs.
    pub fn with_tabs(mut self, tabs: Vec<Tab>) -> Self {
        self.tabs = tabs;
        self
    }

    /// Returns the collection path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the base cache key shared by every tab.
    pub fn base_key(&self) -> &CacheKey {
        &self.base_key
    }

    /// Returns the declared tabs.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Looks up a tab by id.
    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    /// The tab a grid starts on.
    pub fn initial_tab(&self, selection: &TabSelection) -> Option<String> {
        match selection {
            TabSelection::External(active) => Some(active.clone()),
            TabSelection::Internal { default: Some(default) } => Some(default.clone()),
            TabSelection::Internal { default: None } => self.tabs.first().map(|t| t.id.clone()),
        }
    }

    /// Resolves the request and cache key for the active tab.
    ///
    /// An active tab id that is not declared contributes no parameters but
    /// still gets its own cache key.
    pub fn resolve(&self, active: Option<&str>) -> ResolvedQuery {
        let params = match active.and_then(|id| self.tab(id)) {
            Some(tab) => self.base_params.merged(&tab.params),
            None => self.base_params.clone(),
        };

        let cache_key = match active {
            Some(id) => self.base_key.child(id),
            None => self.base_key.clone(),
        };

        ResolvedQuery {
            path: self.path.clone(),
            query_string: params.to_query_string(),
            cache_key,
            tab: active.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> QueryResolver {
        QueryResolver::new("/users", "users")
            .with_params(QueryParams::new().with("active", true).with("role", "any"))
            .with_tabs(vec![
                Tab::new("all", "All"),
                Tab::new("admin", "Admins").params(QueryParams::new().with("role", "admin")),
            ])
    }

    #[test]
    fn test_tab_overlay_wins() {
        let query = resolver().resolve(Some("admin"));
        assert_eq!(query.query_string, "active=true&role=admin");
        assert_eq!(query.list_path(), "/users?active=true&role=admin");
        assert_eq!(query.cache_key, CacheKey::new(["users", "admin"]));
    }

    #[test]
    fn test_tabs_get_distinct_keys() {
        let r = resolver();
        assert_ne!(r.resolve(Some("all")).cache_key, r.resolve(Some("admin")).cache_key);
        assert_eq!(r.resolve(None).cache_key, CacheKey::from("users"));
    }

    #[test]
    fn test_null_params_omitted() {
        let params = QueryParams::new()
            .with("q", "a b&c")
            .with("skip", Value::Null)
            .with("ids", json!([1, 2, null]));
        assert_eq!(params.to_query_string(), "ids=1%2C2&q=a+b%26c");
    }

    #[test]
    fn test_empty_params_leave_path_alone() {
        let query = QueryResolver::new("/roles", "roles").resolve(None);
        assert_eq!(query.list_path(), "/roles");
    }

    #[test]
    fn test_initial_tab() {
        let r = resolver();
        assert_eq!(r.initial_tab(&TabSelection::first()).as_deref(), Some("all"));
        assert_eq!(
            r.initial_tab(&TabSelection::Internal { default: Some("admin".into()) }).as_deref(),
            Some("admin")
        );
        assert_eq!(r.initial_tab(&TabSelection::External("x".into())).as_deref(), Some("x"));
        assert_eq!(QueryResolver::new("/a", "a").initial_tab(&TabSelection::first()), None);
    }
}
