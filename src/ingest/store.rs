/// Input store loader.
///
/// Reads the per-category series store: one JSON document mapping each
/// category name (modality) to its stored series. The file is read in full
/// and closed before anything is analyzed.
///
/// A stored series is either
///   - an object of `date -> value` (a single column indexed by date), or
///   - a pandas "split" table: `{"columns": [...], "index": [...], "data": [[...]]}`.
///
/// Anything else is kept as `RawSeries::Unrecognized` so that the category
/// can be reported and skipped by the normalizer without aborting the load.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::model::RawSeries;

// ============================================================================
// Store
// ============================================================================

/// All stored series, in the order the document lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    series: Vec<(String, RawSeries)>,
}

impl SeriesStore {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

}

impl IntoIterator for SeriesStore {
    type Item = (String, RawSeries);
    type IntoIter = std::vec::IntoIter<(String, RawSeries)>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

impl FromIterator<(String, RawSeries)> for SeriesStore {
    fn from_iter<I: IntoIterator<Item = (String, RawSeries)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures that prevent the store from being loaded at all.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store file could not be read.
    Io { path: String, message: String },
    /// The file is not valid JSON.
    Parse(String),
    /// The top-level JSON value is not a name -> series mapping.
    NotAMapping(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, message } => {
                write!(f, "Cannot read series store {}: {}", path, message)
            }
            StoreError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StoreError::NotAMapping(kind) => {
                write!(f, "Series store must map category names to series, found {}", kind)
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ============================================================================
// Loading
// ============================================================================

/// Loads the store from a JSON file.
pub fn load_store(path: &Path) -> Result<SeriesStore, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_store(&text)
}

/// Parses a store document already held in memory.
pub fn parse_store(text: &str) -> Result<SeriesStore, StoreError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| StoreError::Parse(e.to_string()))?;

    match document {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, stored)| (name, raw_series_from_json(stored)))
            .collect()),
        other => Err(StoreError::NotAMapping(json_kind(&other).to_string())),
    }
}

/// Classifies one stored JSON value into a `RawSeries`.
pub fn raw_series_from_json(stored: Value) -> RawSeries {
    match stored {
        Value::Object(map) if map.contains_key("columns") && map.contains_key("data") => {
            table_from_split(map)
        }
        Value::Object(map) => RawSeries::SingleColumn(
            map.into_iter()
                .map(|(index, value)| (Value::String(index), value))
                .collect(),
        ),
        other => RawSeries::Unrecognized(json_kind(&other).to_string()),
    }
}

/// Reads a pandas `orient="split"` table.
///
/// With exactly one column the index carries the dates, which makes it a
/// single-column series. Otherwise the table is kept as is and the
/// normalizer decides whether it has enough columns.
fn table_from_split(mut map: Map<String, Value>) -> RawSeries {
    let columns: Vec<String> = match map.remove("columns") {
        Some(Value::Array(columns)) => columns
            .into_iter()
            .map(|c| match c {
                Value::String(name) => name,
                other => other.to_string(),
            })
            .collect(),
        _ => return RawSeries::Unrecognized("split table without a column list".to_string()),
    };

    let rows: Vec<Vec<Value>> = match map.remove("data") {
        Some(Value::Array(rows)) => rows
            .into_iter()
            .map(|row| match row {
                Value::Array(cells) => cells,
                scalar => vec![scalar],
            })
            .collect(),
        _ => return RawSeries::Unrecognized("split table without a data array".to_string()),
    };

    let index = match map.remove("index") {
        Some(Value::Array(index)) => Some(index),
        _ => None,
    };

    match (columns.len(), index) {
        (1, Some(index)) => RawSeries::SingleColumn(
            index
                .into_iter()
                .zip(rows.into_iter().map(|row| row.into_iter().next().unwrap_or(Value::Null)))
                .collect(),
        ),
        _ => RawSeries::MultiColumn { columns, rows },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize::normalize;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_object_of_dates_is_single_column() {
        let raw = raw_series_from_json(json!({"2024-01-01": 3, "2024-01-02": 4}));
        assert_eq!(
            raw,
            RawSeries::SingleColumn(vec![
                (json!("2024-01-01"), json!(3)),
                (json!("2024-01-02"), json!(4)),
            ])
        );
    }

    #[test]
    fn test_split_table_with_two_columns_is_multi_column() {
        let raw = raw_series_from_json(json!({
            "columns": ["ds", "y"],
            "index": [0, 1],
            "data": [["2024-01-01", 3], ["2024-01-02", 4]]
        }));
        match raw {
            RawSeries::MultiColumn { columns, rows } => {
                assert_eq!(columns, vec!["ds", "y"]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("expected multi column, got {:?}", other),
        }
    }

    #[test]
    fn test_split_table_with_one_column_uses_index_as_dates() {
        let raw = raw_series_from_json(json!({
            "columns": ["CT"],
            "index": ["2024-01-01", "2024-01-02"],
            "data": [[3], [4]]
        }));
        assert_eq!(
            raw,
            RawSeries::SingleColumn(vec![
                (json!("2024-01-01"), json!(3)),
                (json!("2024-01-02"), json!(4)),
            ])
        );
    }

    #[test]
    fn test_one_column_without_index_stays_a_table() {
        // The normalizer rejects this later, per category.
        let raw = raw_series_from_json(json!({"columns": ["y"], "data": [[1], [2]]}));
        assert!(matches!(raw, RawSeries::MultiColumn { ref columns, .. } if columns.len() == 1));
    }

    #[test]
    fn test_non_object_series_is_unrecognized() {
        assert_eq!(
            raw_series_from_json(json!([1, 2, 3])),
            RawSeries::Unrecognized("array".to_string())
        );
        assert_eq!(
            raw_series_from_json(json!(null)),
            RawSeries::Unrecognized("null".to_string())
        );
    }

    #[test]
    fn test_parse_store_keeps_every_category_in_document_order() {
        let store = parse_store(r#"{"MRI": {"2024-01-01": 1}, "CT": [1, 2], "X-ray": {}}"#)
            .expect("valid document");
        assert_eq!(store.len(), 3);

        let entries: Vec<(String, RawSeries)> = store.into_iter().collect();
        let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["MRI", "CT", "X-ray"]);
        assert_eq!(entries[1].1, RawSeries::Unrecognized("array".to_string()));
    }

    #[test]
    fn test_epoch_millisecond_keys_survive_normalization() {
        // pandas Series.to_json() default: {"<epoch ms>": value}
        let store = parse_store(r#"{"CT": {"1754006400000": 5, "1754092800000": 7}}"#)
            .expect("valid document");
        let (name, raw) = store.into_iter().next().expect("one category");
        assert_eq!(name, "CT");

        let series = normalize(&raw).expect("date-indexed object is supported");
        assert_eq!(series.len(), 2);
        let obs = series.observations();
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert_eq!(obs[0].value, 5.0);
        assert_eq!(obs[1].date, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap());
        assert_eq!(obs[1].value, 7.0);
    }

    #[test]
    fn test_parse_store_rejects_non_mapping_document() {
        assert_eq!(
            parse_store("[1, 2]"),
            Err(StoreError::NotAMapping("array".to_string()))
        );
        assert!(matches!(parse_store("{not json"), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_load_store_reports_missing_file() {
        let result = load_store(Path::new("/nonexistent/service_time_series.json"));
        match result {
            Err(StoreError::Io { path, .. }) => assert!(path.contains("service_time_series")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
