//! Type-aware, stable record sorting.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::inference::ColumnType;
use super::inference::ColumnTypeCache;
use super::inference::parse_date;
use super::inference::parse_number_prefix;
use crate::model::Record;
use crate::model::is_blank;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first).
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    #[default]
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// The column a grid is sorted by, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortStatus {
    /// Attribute key (dot paths allowed).
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortStatus {
    /// Ascending sort on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Comparable form of a cell. `None` in a slot means "sorts last".
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Date(i64),
    Text(String),
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sort_key(value: Option<&Value>, column: ColumnType) -> Option<SortKey> {
    if is_blank(value) {
        return None;
    }
    let value = value?;

    match column {
        ColumnType::Date => match value {
            Value::String(s) => parse_date(s).map(|d| SortKey::Date(d.timestamp_millis())),
            _ => None,
        },
        ColumnType::Number => parse_number_prefix(value).map(SortKey::Number),
        ColumnType::String | ColumnType::Mixed => {
            Some(SortKey::Text(text_of(value).trim().to_lowercase()))
        }
    }
}

fn compare_keys(a: &Option<SortKey>, b: &Option<SortKey>, direction: SortDirection) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };

    let ordering = match (a, b) {
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        _ => Ordering::Equal,
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Sorts records by a field whose type is already known.
///
/// The sort is stable in both directions. Missing, null and empty values,
/// and values that cannot be read as the column type, always come last.
pub fn sort_records_as(
    records: &[Record],
    field: &str,
    direction: SortDirection,
    column: ColumnType,
) -> Vec<Record> {
    let mut keyed: Vec<(Option<SortKey>, &Record)> = records
        .iter()
        .map(|record| (sort_key(record.get_path(field), column), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, direction));

    keyed.into_iter().map(|(_, record)| record.clone()).collect()
}

/// Sorts records by the sort status, inferring the column type through the cache.
pub fn sort_records(records: &[Record], status: &SortStatus, types: &ColumnTypeCache) -> Vec<Record> {
    if records.is_empty() {
        return Vec::new();
    }
    let column = types.detect(records, &status.field);
    sort_records_as(records, &status.field, status.direction, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Record::new().set("id", i as i64).set("v", v))
            .collect()
    }

    fn values(sorted: &[Record]) -> Vec<Value> {
        sorted.iter().map(|r| r.get("v").cloned().unwrap_or(Value::Null)).collect()
    }

    fn ids(sorted: &[Record]) -> Vec<i64> {
        sorted.iter().map(|r| r.get("id").and_then(Value::as_i64).unwrap()).collect()
    }

    #[test]
    fn test_numeric_strings_sort_numerically() {
        let cache = ColumnTypeCache::new();
        let sorted = sort_records(&records(vec![json!("3"), json!("10"), json!("2")]), &SortStatus::asc("v"), &cache);
        assert_eq!(values(&sorted), vec![json!("2"), json!("3"), json!("10")]);
    }

    #[test]
    fn test_blanks_last_in_both_directions() {
        let cache = ColumnTypeCache::new();
        let input = records(vec![json!(null), json!("b"), json!(""), json!("a"), json!("c")]);

        let asc = sort_records(&input, &SortStatus::asc("v"), &cache);
        assert_eq!(ids(&asc), vec![3, 1, 4, 0, 2]);

        let desc = sort_records(&input, &SortStatus::desc("v"), &cache);
        assert_eq!(ids(&desc), vec![4, 1, 3, 0, 2]);
    }

    #[test]
    fn test_missing_field_sorts_last() {
        let cache = ColumnTypeCache::new();
        let mut input = records(vec![json!(2), json!(1)]);
        input.insert(0, Record::new().set("id", 99));
        let asc = sort_records(&input, &SortStatus::asc("v"), &cache);
        assert_eq!(ids(&asc), vec![1, 0, 99]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let input = records(vec![json!("B"), json!("a"), json!("b"), json!("A")]);
        let asc = sort_records_as(&input, "v", SortDirection::Asc, ColumnType::String);
        assert_eq!(ids(&asc), vec![1, 3, 0, 2]);

        let desc = sort_records_as(&input, "v", SortDirection::Desc, ColumnType::String);
        assert_eq!(ids(&desc), vec![0, 2, 1, 3]);

        // Re-sorting the ascending output descending keeps tie order.
        let again = sort_records_as(&asc, "v", SortDirection::Desc, ColumnType::String);
        assert_eq!(ids(&again), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_dates_sort_chronologically() {
        let input = records(vec![json!("31.12.2023"), json!("2024-02-01"), json!("01/15/2024"), json!("soon")]);
        let asc = sort_records_as(&input, "v", SortDirection::Asc, ColumnType::Date);
        assert_eq!(ids(&asc), vec![0, 2, 1, 3]);

        let desc = sort_records_as(&input, "v", SortDirection::Desc, ColumnType::Date);
        assert_eq!(ids(&desc), vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_unparseable_number_sorts_last() {
        let input = records(vec![json!("n/a"), json!(5), json!("1.5")]);
        let asc = sort_records_as(&input, "v", SortDirection::Asc, ColumnType::Number);
        assert_eq!(ids(&asc), vec![2, 1, 0]);
        let desc = sort_records_as(&input, "v", SortDirection::Desc, ColumnType::Number);
        assert_eq!(ids(&desc), vec![1, 2, 0]);
    }

    #[test]
    fn test_unit_suffixed_numbers_use_leading_value() {
        let input = records(vec![json!("12 kg"), json!("3.5%"), json!(7), json!("kg 4")]);
        let asc = sort_records_as(&input, "v", SortDirection::Asc, ColumnType::Number);
        assert_eq!(ids(&asc), vec![1, 2, 0, 3]);
        let desc = sort_records_as(&input, "v", SortDirection::Desc, ColumnType::Number);
        assert_eq!(ids(&desc), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_text_is_trimmed_and_case_folded() {
        let input = records(vec![json!("  zeta"), json!("Alpha "), json!("beta")]);
        let asc = sort_records_as(&input, "v", SortDirection::Asc, ColumnType::Mixed);
        assert_eq!(ids(&asc), vec![1, 2, 0]);
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&SortDirection::Asc).unwrap(), "\"asc\"");
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
    }
}
