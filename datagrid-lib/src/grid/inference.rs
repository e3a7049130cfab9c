//! Column type inference.
//!
//! Looks at a sample of a column's values and guesses whether the column
//! holds numbers, dates, or text, so sorting can compare values by meaning
//! instead of by their string form.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;

use crate::model::Record;
use crate::model::is_blank;

/// Maximum number of non-empty values inspected per column.
pub const SAMPLE_SIZE: usize = 100;

/// Share of the sample a category needs to win.
pub const DOMINANCE: f64 = 0.6;

static DATE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("valid ISO datetime pattern"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid ISO date pattern"),
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("valid US date pattern"),
        Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}$").expect("valid dotted date pattern"),
    ]
});

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid number prefix pattern")
});

/// The semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Number,
    Date,
    /// No category reached the dominance threshold.
    Mixed,
}

/// Parses a number the way a column cell would be read.
///
/// Native JSON numbers qualify, as do strings that trim to a finite decimal.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Reads the leading number of a cell, ignoring any trailing text.
///
/// `"12 kg"` reads as 12 and `"3.5%"` as 3.5. Used for sort keys once a
/// column is known to be numeric; classification uses [`parse_number`].
pub fn parse_number_prefix(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_PREFIX
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Parses a date string in one of the recognised formats.
///
/// Recognised: ISO datetime (with or without offset), ISO date,
/// `MM/DD/YYYY` and `DD.MM.YYYY`. Naive values are taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    let [iso_datetime, iso_date, us_date, dotted_date] = &*DATE_PATTERNS;

    if iso_datetime.is_match(trimmed) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(parsed.with_timezone(&Utc));
        }
        return NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc());
    }

    let format = if iso_date.is_match(trimmed) {
        "%Y-%m-%d"
    } else if us_date.is_match(trimmed) {
        "%m/%d/%Y"
    } else if dotted_date.is_match(trimmed) {
        "%d.%m.%Y"
    } else {
        return None;
    };

    NaiveDate::parse_from_str(trimmed, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    String,
    Number,
    Date,
}

fn classify(value: &Value) -> Category {
    match value {
        Value::Number(_) => Category::Number,
        Value::String(s) => {
            if parse_number(value).is_some() {
                Category::Number
            } else if parse_date(s).is_some() {
                Category::Date
            } else {
                Category::String
            }
        }
        _ => Category::String,
    }
}

fn sample<'a>(records: &'a [Record], field: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    records
        .iter()
        .map(move |record| record.get_path(field))
        .filter(|value| !is_blank(*value))
        .flatten()
        .take(SAMPLE_SIZE)
}

/// Classifies a column from its first [`SAMPLE_SIZE`] non-empty values.
///
/// A column without any non-empty value is treated as text.
pub fn detect_column_type(records: &[Record], field: &str) -> ColumnType {
    let (mut strings, mut numbers, mut dates) = (0usize, 0usize, 0usize);
    for value in sample(records, field) {
        match classify(value) {
            Category::String => strings += 1,
            Category::Number => numbers += 1,
            Category::Date => dates += 1,
        }
    }

    let total = strings + numbers + dates;
    if total == 0 {
        return ColumnType::String;
    }

    let share = |count: usize| count as f64 / total as f64;
    if share(dates) >= DOMINANCE {
        ColumnType::Date
    } else if share(numbers) >= DOMINANCE {
        ColumnType::Number
    } else if share(strings) >= DOMINANCE {
        ColumnType::String
    } else {
        ColumnType::Mixed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeCacheKey {
    field: String,
    len: usize,
    fingerprint: u64,
}

/// Memo of column classifications.
///
/// Entries are keyed by field, collection size and a fingerprint of the
/// sampled values, so a collection whose content changes at constant size is
/// classified again. Entries live as long as the cache; call
/// [`ColumnTypeCache::clear`] to drop them.
#[derive(Debug, Default)]
pub struct ColumnTypeCache {
    entries: DashMap<TypeCacheKey, ColumnType>,
}

impl ColumnTypeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column type, classifying the column on a miss.
    pub fn detect(&self, records: &[Record], field: &str) -> ColumnType {
        let key = TypeCacheKey {
            field: field.to_string(),
            len: records.len(),
            fingerprint: fingerprint(records, field),
        };

        if let Some(hit) = self.entries.get(&key) {
            return *hit;
        }

        let detected = detect_column_type(records, field);
        log::debug!("Column {} classified as {:?}", field, detected);
        self.entries.insert(key, detected);
        detected
    }

    /// Number of memoized classifications.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every memoized classification.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

fn fingerprint(records: &[Record], field: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    for value in sample(records, field) {
        value.to_string().hash(&mut hasher);
    }
    hasher.finish()
}
