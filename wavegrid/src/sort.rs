//! Client-side ordering of the rendered view.
//!
//! Sorting never reorders the caller's rows; it yields dataset positions in
//! display order, which pagination then slices.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::Dataset;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

/// Active ordering of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl SortState {
    /// Ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

// Rank of a value's type when comparing across types. Nulls and missing
// fields are handled separately so they stay last in both directions.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Compare two non-null field values in ascending order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Dataset positions in display order.
///
/// Without a sort state this is `0..len`. The sort is stable, so equal
/// values keep their dataset order.
pub fn sorted_indices(dataset: &Dataset, sort: Option<&SortState>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let Some(sort) = sort else {
        return indices;
    };
    let field_of = |index: usize| {
        dataset
            .row(index)
            .and_then(|row| row.get(&sort.field))
            .filter(|value| !value.is_null())
    };
    indices.sort_by(|&a, &b| match (field_of(a), field_of(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_values(x, y);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::from_value(
            json!([
                {"name": "b", "n": 10},
                {"name": "a", "n": null},
                {"name": "c", "n": 2},
                {"name": "B"}
            ]),
            None,
        )
    }

    #[test]
    fn test_unsorted_is_dataset_order() {
        assert_eq!(sorted_indices(&dataset(), None), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_numbers_sort_numerically_with_nulls_last() {
        let data = dataset();
        assert_eq!(sorted_indices(&data, Some(&SortState::asc("n"))), vec![2, 0, 1, 3]);
        assert_eq!(sorted_indices(&data, Some(&SortState::desc("n"))), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_strings_sort_lexically() {
        let data = dataset();
        assert_eq!(sorted_indices(&data, Some(&SortState::asc("name"))), vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_dataset_untouched() {
        let data = dataset();
        sorted_indices(&data, Some(&SortState::desc("name")));
        assert_eq!(data.row(0).unwrap()["name"], json!("b"));
    }
}
