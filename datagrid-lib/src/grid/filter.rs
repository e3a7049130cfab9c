//! Declarative record filters, combined with AND semantics.

use chrono::NaiveDate;
use serde_json::Value;

use super::inference::parse_date;
use crate::model::ID_FIELD;
use crate::model::Record;

const BOUND_FORMAT: &str = "%Y-%m-%d";

/// The value half of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Case-sensitive substring match against a string field.
    Contains(String),
    /// Membership test against array or object fields.
    AnyOf(Vec<String>),
    /// Inclusive date range over a date-like string field. Either bound may be open.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Strict equality with a boolean field.
    Bool(bool),
}

/// A predicate over one field. A filter without a value always passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Attribute key (dot paths allowed).
    pub field: String,
    /// Filter value, `None` when the filter is not set.
    pub value: Option<FilterValue>,
}

impl Filter {
    /// Creates a filter that is not set.
    pub fn unset(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
        }
    }

    /// Substring filter.
    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Some(FilterValue::Contains(needle.into())),
        }
    }

    /// Membership filter over a list of accepted values.
    pub fn any_of<I, S>(field: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            value: Some(FilterValue::AnyOf(accepted.into_iter().map(Into::into).collect())),
        }
    }

    /// Date range filter.
    pub fn date_range(field: impl Into<String>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            field: field.into(),
            value: Some(FilterValue::DateRange { from, to }),
        }
    }

    /// Date range filter from `YYYY-MM-DD` strings. Unparseable bounds are treated as open.
    pub fn date_range_str(field: impl Into<String>, from: Option<&str>, to: Option<&str>) -> Self {
        let parse = |s: &str| NaiveDate::parse_from_str(s.trim(), BOUND_FORMAT).ok();
        Self::date_range(field, from.and_then(parse), to.and_then(parse))
    }

    /// Boolean equality filter.
    pub fn equals(field: impl Into<String>, value: bool) -> Self {
        Self {
            field: field.into(),
            value: Some(FilterValue::Bool(value)),
        }
    }

    /// Returns `true` if the filter has a value.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if the record passes this filter.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(value) = &self.value else {
            return true;
        };
        let target = record.get_path(&self.field);

        match value {
            FilterValue::Contains(needle) => match target {
                Some(Value::String(s)) => s.contains(needle.as_str()),
                _ => false,
            },
            FilterValue::AnyOf(accepted) => matches_any_of(target, accepted),
            FilterValue::DateRange { from, to } => matches_date_range(target, *from, *to),
            FilterValue::Bool(expected) => matches!(target, Some(Value::Bool(b)) if b == expected),
        }
    }
}

/// Returns the records that pass every filter, in their original order.
pub fn apply(records: &[Record], filters: &[Filter]) -> Vec<Record> {
    if filters.iter().all(|f| !f.is_set()) {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| filters.iter().all(|f| f.matches(record)))
        .cloned()
        .collect()
}

// =============================================================================
// Membership
// =============================================================================

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_accepted(value: &Value, accepted: &[String]) -> bool {
    scalar_text(value).is_some_and(|text| accepted.iter().any(|a| *a == text))
}

fn object_id_accepted(value: &Value, accepted: &[String]) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get(ID_FIELD))
        .is_some_and(|id| is_accepted(id, accepted))
}

fn element_matches(element: &Value, accepted: &[String]) -> bool {
    match element {
        Value::Object(obj) => {
            object_id_accepted(element, accepted)
                || obj.values().any(|property| match property {
                    Value::String(s) => accepted.iter().any(|a| a == s),
                    Value::Object(_) => object_id_accepted(property, accepted),
                    _ => false,
                })
        }
        other => is_accepted(other, accepted),
    }
}

fn matches_any_of(target: Option<&Value>, accepted: &[String]) -> bool {
    if accepted.is_empty() {
        return true;
    }

    match target {
        Some(Value::Array(items)) => items.iter().any(|item| element_matches(item, accepted)),
        Some(obj @ Value::Object(map)) if map.contains_key(ID_FIELD) => object_id_accepted(obj, accepted),
        _ => true,
    }
}

// =============================================================================
// Date range
// =============================================================================

/// The date part of a date-like string: text before the first space, with an
/// ISO time suffix dropped.
fn date_portion(value: &str) -> &str {
    let head = value.split(' ').next().unwrap_or(value);
    match head.find('T') {
        Some(idx) if idx == 10 => &head[..idx],
        _ => head,
    }
}

fn matches_date_range(target: Option<&Value>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(Value::String(raw)) = target else {
        return true;
    };
    let portion = date_portion(raw);

    match NaiveDate::parse_from_str(portion, BOUND_FORMAT)
        .ok()
        .or_else(|| parse_date(portion).map(|d| d.date_naive()))
    {
        Some(date) => from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t),
        None => {
            // Fall back to comparing the raw text with the formatted bounds.
            let after = from.is_none_or(|f| portion >= f.format(BOUND_FORMAT).to_string().as_str());
            let before = to.is_none_or(|t| portion <= t.format(BOUND_FORMAT).to_string().as_str());
            after && before
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(field: &str, value: Value) -> Record {
        Record::new().set("id", 1).set(field, value)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, BOUND_FORMAT).unwrap()
    }

    #[test]
    fn test_no_filters_is_identity() {
        let records = vec![record("name", json!("a")), record("name", json!(null))];
        assert_eq!(apply(&records, &[]), records);
        assert_eq!(apply(&records, &[Filter::unset("name")]), records);
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let r = record("name", json!("Alice Smith"));
        assert!(Filter::contains("name", "Smith").matches(&r));
        assert!(!Filter::contains("name", "smith").matches(&r));
    }

    #[test]
    fn test_contains_rejects_non_strings() {
        assert!(!Filter::contains("age", "4").matches(&record("age", json!(42))));
        assert!(!Filter::contains("missing", "x").matches(&Record::new()));
    }

    #[test]
    fn test_any_of_array_scalars() {
        let r = record("tags", json!(["red", 7]));
        assert!(Filter::any_of("tags", ["red"]).matches(&r));
        assert!(Filter::any_of("tags", ["7"]).matches(&r));
        assert!(!Filter::any_of("tags", ["blue"]).matches(&r));
    }

    #[test]
    fn test_any_of_array_objects() {
        let r = record(
            "roles",
            json!([
                {"id": 3, "name": "admin"},
                {"id": 4, "group": {"id": "g1"}},
                {"id": 5, "deep": {"inner": {"id": "nope"}}}
            ]),
        );
        assert!(Filter::any_of("roles", ["3"]).matches(&r));
        assert!(Filter::any_of("roles", ["admin"]).matches(&r));
        assert!(Filter::any_of("roles", ["g1"]).matches(&r));
        // Only one level of nesting is traversed.
        assert!(!Filter::any_of("roles", ["nope"]).matches(&r));
    }

    #[test]
    fn test_any_of_single_object() {
        let r = record("owner", json!({"id": "u1", "name": "Ann"}));
        assert!(Filter::any_of("owner", ["u1"]).matches(&r));
        assert!(!Filter::any_of("owner", ["u2"]).matches(&r));
    }

    #[test]
    fn test_any_of_unsupported_targets_pass() {
        assert!(Filter::any_of("name", ["x"]).matches(&record("name", json!("y"))));
        assert!(Filter::any_of("name", ["x"]).matches(&Record::new()));
        assert!(Filter::any_of("tags", Vec::<String>::new()).matches(&record("tags", json!(["a"]))));
    }

    #[test]
    fn test_date_range_lower_bound_only() {
        let filter = Filter::date_range("created", Some(date("2024-01-01")), None);
        assert!(!filter.matches(&record("created", json!("2023-12-31"))));
        assert!(filter.matches(&record("created", json!("2024-06-01"))));
        assert!(filter.matches(&record("created", json!("2024-01-01 08:00"))));
    }

    #[test]
    fn test_date_range_inclusive_bounds() {
        let filter = Filter::date_range_str("created", Some("2024-01-01"), Some("2024-01-31"));
        assert!(filter.matches(&record("created", json!("2024-01-31T23:59:59Z"))));
        assert!(filter.matches(&record("created", json!("2024-01-01"))));
        assert!(!filter.matches(&record("created", json!("2024-02-01 00:00"))));
    }

    #[test]
    fn test_date_range_passes_without_bounds_or_string() {
        let open = Filter::date_range("created", None, None);
        assert!(open.matches(&record("created", json!("1999-01-01"))));

        let bounded = Filter::date_range_str("created", Some("2024-01-01"), None);
        assert!(bounded.matches(&record("created", json!(null))));
        assert!(bounded.matches(&Record::new()));
    }

    #[test]
    fn test_bool_strict_equality() {
        let filter = Filter::equals("active", true);
        assert!(filter.matches(&record("active", json!(true))));
        assert!(!filter.matches(&record("active", json!(false))));
        assert!(!filter.matches(&record("active", json!("true"))));
    }

    #[test]
    fn test_filters_compose_with_and() {
        let records = vec![
            Record::new().set("id", 1).set("name", "Ann").set("active", true),
            Record::new().set("id", 2).set("name", "Anna").set("active", false),
            Record::new().set("id", 3).set("name", "Bob").set("active", true),
        ];
        let out = apply(&records, &[Filter::contains("name", "Ann"), Filter::equals("active", true)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("id"), Some(&json!(1)));
    }
}
