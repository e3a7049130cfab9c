//! Dynamic entity record

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use super::EntityId;

/// Name of the identity attribute.
pub const ID_FIELD: &str = "id";

/// A dynamic entity record.
///
/// Records hold their attributes as a JSON object, so any backend payload
/// can be carried without a schema. Identity is the only attribute the grid
/// relies on; everything else is described by
/// [`FieldDescriptor`](super::FieldDescriptor)s.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Record;
///
/// let record = Record::new()
///     .set("id", 1)
///     .set("name", "Ada")
///     .set("team", serde_json::json!({ "id": "t1", "name": "Core" }));
///
/// assert_eq!(record.get_str("name"), Some("Ada"));
/// assert_eq!(record.get_path("team.name").and_then(|v| v.as_str()), Some("Core"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from a JSON object map.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Creates a record from a JSON value, if it is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Converts any serializable struct into a record.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(value)?)
    }

    /// Converts the record into a typed struct.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the record id, if set.
    pub fn id(&self) -> Option<EntityId> {
        self.fields.get(ID_FIELD).and_then(EntityId::from_json)
    }

    /// Returns `true` if the record has the given id.
    pub fn has_id(&self, id: &EntityId) -> bool {
        self.id().as_ref() == Some(id)
    }

    /// Sets the record id.
    pub fn set_id(&mut self, id: &EntityId) {
        self.fields.insert(ID_FIELD.to_string(), id.to_json());
    }

    /// Returns the record with its id set.
    pub fn with_id(mut self, id: &EntityId) -> Self {
        self.set_id(id);
        self
    }

    /// Returns the record with its id removed.
    pub fn without_id(mut self) -> Self {
        self.fields.remove(ID_FIELD);
        self
    }

    // =========================================================================
    // Field access
    // =========================================================================

    /// Returns a top-level attribute.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns an attribute addressed by a dot path (`"team.name"`).
    ///
    /// Path segments step into objects by key and into arrays by index.
    /// A path without dots behaves like [`Record::get`].
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns a string attribute addressed by a dot path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Returns `true` if the attribute is missing, null, or an empty string.
    pub fn is_blank(&self, path: &str) -> bool {
        is_blank(self.get_path(path))
    }

    /// Returns `true` if the record contains the given top-level attribute.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all attributes.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Sets an attribute, returning the record for chaining.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets an attribute in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Sets an attribute addressed by a dot path, creating nested objects.
    ///
    /// `"team.name"` writes `{"team": {"name": value}}`. A non-object value
    /// standing in the way is replaced by an object.
    pub fn insert_path(&mut self, path: &str, value: impl Into<Value>) {
        let Some((parents, leaf)) = path.rsplit_once('.') else {
            self.fields.insert(path.to_string(), value.into());
            return;
        };

        let mut map = &mut self.fields;
        for segment in parents.split('.') {
            let slot = map.entry(segment.to_string()).or_insert(Value::Null);
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            map = match slot {
                Value::Object(inner) => inner,
                _ => return,
            };
        }
        map.insert(leaf.to_string(), value.into());
    }

    /// Removes an attribute.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Shallow-merges every attribute of `partial` over this record.
    pub fn merge(&mut self, partial: &Record) {
        for (key, value) in &partial.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Consumes the record and returns it as a JSON value.
    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Returns `true` for a missing value, JSON null, or the empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_path_builds_nested_objects() {
        let mut record = Record::new().set("team", json!({"id": 4})).set("tag", "x");
        record.insert_path("team.name", "core");
        record.insert_path("tag.label", "urgent");
        record.insert_path("plain", 1);

        assert_eq!(record.get("team"), Some(&json!({"id": 4, "name": "core"})));
        assert_eq!(record.get("tag"), Some(&json!({"label": "urgent"})));
        assert_eq!(record.get_path("team.name"), Some(&json!("core")));
        assert_eq!(record.get("plain"), Some(&json!(1)));
        assert!(!record.contains("team.name"));
    }

    #[test]
    fn test_id_roundtrip() {
        let record = Record::new().with_id(&EntityId::from(7));
        assert_eq!(record.id(), Some(EntityId::Number(7)));
        assert_eq!(record.get("id"), Some(&json!(7)));
        assert_eq!(record.without_id().id(), None);
    }

    #[test]
    fn test_get_path_nested() {
        let record = Record::from_json(json!({
            "owner": { "profile": { "name": "Ada" } },
            "tags": ["a", "b"],
        }))
        .unwrap();

        assert_eq!(record.get_str("owner.profile.name"), Some("Ada"));
        assert_eq!(record.get_str("tags.1"), Some("b"));
        assert_eq!(record.get_path("owner.missing"), None);
        assert_eq!(record.get_path("tags.9"), None);
    }

    #[test]
    fn test_literal_dotted_key_wins() {
        let record = Record::new().set("a.b", 1).set("a", json!({ "b": 2 }));
        assert_eq!(record.get_path("a.b"), Some(&json!(1)));
    }

    #[test]
    fn test_blank() {
        let record = Record::new().set("empty", "").set("null", Value::Null).set("zero", 0);
        assert!(record.is_blank("empty"));
        assert!(record.is_blank("null"));
        assert!(record.is_blank("missing"));
        assert!(!record.is_blank("zero"));
    }

    #[test]
    fn test_merge_overwrites_shallowly() {
        let mut record = Record::new().set("id", 1).set("name", "a").set("role", "user");
        record.merge(&Record::new().set("id", 1).set("role", "admin"));
        assert_eq!(record.get_str("name"), Some("a"));
        assert_eq!(record.get_str("role"), Some("admin"));
    }

    #[test]
    fn test_typed_conversion() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct User {
            id: i64,
            name: String,
        }

        let user = User { id: 3, name: "Bo".into() };
        let record = Record::from_typed(&user).unwrap();
        assert_eq!(record.id(), Some(EntityId::Number(3)));
        assert_eq!(record.to_typed::<User>().unwrap(), user);
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        assert!(Record::from_json(json!([1, 2])).is_none());
    }
}
