//! Column model builder: declared columns or inference over sample rows.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};

use super::{ColumnDef, ColumnModel, ColumnSource, ValueType, WidgetType};
use crate::dataset::Dataset;

/// Fields the runtime adds to rows for its own bookkeeping.
pub const INTERNAL_FIELDS: &[&str] = &[
    "_wmTableRowId",
    "$$hashKey",
    "$index",
    "_selected",
    "_expanded",
    "_rowIndex",
];

/// Default number of rows sampled during inference.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Default cap on inferred columns.
pub const DEFAULT_MAX_COLUMNS: usize = 20;

static INTERNAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(_wm|__)").expect("static pattern"));

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("static pattern"));

/// Tuning knobs for column inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOptions {
    /// Number of leading rows whose keys are unioned.
    pub sample_size: usize,
    /// Maximum number of inferred columns.
    pub max_columns: usize,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

/// Build the column model for a grid.
///
/// Declared columns win unconditionally. Without them, columns are inferred
/// from the dataset and the model is flagged dynamic even when inference
/// yields nothing.
pub fn build_columns(declared: &[ColumnDef], dataset: &Dataset, options: InferOptions) -> ColumnModel {
    if !declared.is_empty() {
        return ColumnModel {
            columns: declared.to_vec(),
            source: ColumnSource::Static,
        };
    }
    let columns = if dataset.is_valid() {
        infer_columns(dataset.rows(), options)
    } else {
        Vec::new()
    };
    log::debug!("Inferred {} dynamic columns", columns.len());
    ColumnModel {
        columns,
        source: ColumnSource::Dynamic,
    }
}

/// Infer columns from sample rows.
///
/// Non-object rows are skipped; if no sampled row is an object the result is
/// empty.
pub fn infer_columns(rows: &[Value], options: InferOptions) -> Vec<ColumnDef> {
    let sample: Vec<&Map<String, Value>> = rows
        .iter()
        .take(options.sample_size)
        .filter_map(Value::as_object)
        .collect();

    let mut keys: Vec<&str> = Vec::new();
    for row in &sample {
        for key in row.keys() {
            if !keys.contains(&key.as_str()) && !is_internal_field(key) {
                keys.push(key);
            }
        }
    }
    keys.truncate(options.max_columns);

    keys.into_iter()
        .map(|key| {
            let value_type = sample
                .iter()
                .filter_map(|row| row.get(key))
                .find(|value| !value.is_null())
                .map(classify)
                .unwrap_or_default();
            ColumnDef::new(key)
                .value_type(value_type)
                .widget(WidgetType::Text)
        })
        .collect()
}

/// Whether a key is runtime bookkeeping rather than row data.
pub fn is_internal_field(key: &str) -> bool {
    INTERNAL_FIELDS.contains(&key) || INTERNAL_PATTERN.is_match(key)
}

/// Classify a single defined value.
pub fn classify(value: &Value) -> ValueType {
    match value {
        Value::Number(_) => ValueType::Number,
        Value::Bool(_) => ValueType::Boolean,
        Value::Object(map) if map.contains_key("$date") => ValueType::Date,
        Value::String(s) if DATE_PREFIX.is_match(s) && parses_as_date(s) => ValueType::Date,
        Value::String(s) if parses_as_finite_number(s) => ValueType::Number,
        _ => ValueType::String,
    }
}

fn parses_as_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn parses_as_finite_number(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Derive a header label from a field key.
///
/// Splits on `_`, `-`, whitespace and lower-to-upper case boundaries, then
/// capitalizes each word: `user_name` and `userName` both become
/// `User Name`.
pub fn title_case(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(value: Value) -> Dataset {
        Dataset::from_value(value, None)
    }

    #[test]
    fn test_declared_columns_win() {
        let declared = vec![ColumnDef::new("only")];
        let model = build_columns(
            &declared,
            &dataset(json!([{"a": 1, "b": 2}])),
            InferOptions::default(),
        );
        assert_eq!(model.columns, declared);
        assert!(!model.is_dynamic());
    }

    #[test]
    fn test_infers_union_of_sampled_keys() {
        let rows = json!([
            {"id": 1, "name": "A"},
            {"id": 2, "email": "b@example.com"},
            {"id": 3, "late": true},
        ]);
        let options = InferOptions {
            sample_size: 2,
            max_columns: 10,
        };
        let model = build_columns(&[], &dataset(rows), options);
        let fields: Vec<&str> = model.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["id", "name", "email"]);
        assert!(model.is_dynamic());
    }

    #[test]
    fn test_excludes_internal_fields() {
        let rows = json!([{"_wmTableRowId": 1, "_wmVisible": true, "__meta": 1, "$$hashKey": "x", "name": "A"}]);
        let columns = infer_columns(rows.as_array().unwrap(), InferOptions::default());
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].field, "name");
    }

    #[test]
    fn test_caps_column_count_in_order() {
        let rows = json!([{"a": 1, "b": 2, "c": 3, "d": 4}]);
        let options = InferOptions {
            sample_size: 10,
            max_columns: 2,
        };
        let columns = infer_columns(rows.as_array().unwrap(), options);
        let fields: Vec<&str> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["a", "b"]);
    }

    #[test]
    fn test_keys_keep_encounter_order_before_cap() {
        let rows = json!([{"zeta": 1, "alpha": 2, "mid": 3}]);
        let options = InferOptions {
            sample_size: 10,
            max_columns: 2,
        };
        let columns = infer_columns(rows.as_array().unwrap(), options);
        let fields: Vec<&str> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["zeta", "alpha"]);
    }

    #[test]
    fn test_type_from_first_defined_value() {
        let rows = json!([
            {"score": null, "joined": "2024-03-01", "code": "42", "flag": false, "name": "x"},
            {"score": 7.5},
        ]);
        let columns = infer_columns(rows.as_array().unwrap(), InferOptions::default());
        let types: Vec<ValueType> = columns.iter().map(|c| c.value_type).collect();
        assert_eq!(
            types,
            [
                ValueType::Number,
                ValueType::Date,
                ValueType::Number,
                ValueType::Boolean,
                ValueType::String
            ]
        );
    }

    #[test]
    fn test_classify_edge_cases() {
        assert_eq!(classify(&json!("2024-13-45")), ValueType::String);
        assert_eq!(classify(&json!("2024-01-05T10:00:00Z")), ValueType::Date);
        assert_eq!(classify(&json!({"$date": 0})), ValueType::Date);
        assert_eq!(classify(&json!("  ")), ValueType::String);
        assert_eq!(classify(&json!("inf")), ValueType::String);
        assert_eq!(classify(&json!("-3.25")), ValueType::Number);
    }

    #[test]
    fn test_empty_and_invalid_datasets_stay_dynamic() {
        let empty = build_columns(&[], &dataset(json!([])), InferOptions::default());
        assert!(empty.columns.is_empty());
        assert!(empty.is_dynamic());

        let invalid = build_columns(&[], &dataset(json!("nope")), InferOptions::default());
        assert!(invalid.columns.is_empty());
        assert!(invalid.is_dynamic());

        let scalars = build_columns(&[], &dataset(json!([1, 2, 3])), InferOptions::default());
        assert!(scalars.columns.is_empty());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("user_name"), "User Name");
        assert_eq!(title_case("createdAt"), "Created At");
        assert_eq!(title_case("order-id"), "Order Id");
        assert_eq!(title_case("id"), "Id");
    }
}
