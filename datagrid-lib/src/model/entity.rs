//! Entity identifiers

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

const TEMPORARY_PREFIX: &str = "temp-";

/// The unique identifier of an entity.
///
/// Backends hand out either numeric or textual ids, so both are accepted
/// and kept in their original JSON shape.
///
/// # Examples
///
/// ```
/// use datagrid_lib::model::EntityId;
///
/// let numeric = EntityId::from(42);
/// let text = EntityId::from("user-7");
/// assert_eq!(numeric.to_string(), "42");
/// assert_eq!(text.to_string(), "user-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric id (e.g. an auto-increment key).
    Number(i64),
    /// Textual id (e.g. a UUID or slug).
    Text(String),
}

impl EntityId {
    /// Creates a fresh placeholder id for a record the server has not confirmed yet.
    pub fn temporary() -> Self {
        Self::Text(format!("{}{}", TEMPORARY_PREFIX, Uuid::new_v4()))
    }

    /// Returns `true` for ids created by [`EntityId::temporary`].
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Text(id) if id.starts_with(TEMPORARY_PREFIX))
    }

    /// Reads an id out of a JSON value.
    ///
    /// Only strings and integral numbers qualify.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Number),
            _ => None,
        }
    }

    /// Converts the id back into JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(v: i64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for EntityId {
    fn from(v: i32) -> Self {
        Self::Number(v as i64)
    }
}

impl From<String> for EntityId {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for EntityId {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Uuid> for EntityId {
    fn from(v: Uuid) -> Self {
        Self::Text(v.to_string())
    }
}
