//! Grid configuration.

use serde::{Deserialize, Serialize};

use crate::column::{ColumnDef, DEFAULT_MAX_COLUMNS, DEFAULT_SAMPLE_SIZE, DEFAULT_TABLE_WIDTH, InferOptions};
use crate::edit::EditMode;
use crate::expansion::ExpansionConfig;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::selection::SelectionMode;

/// Per-grid configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
///
/// # Example
///
/// ```
/// use wavegrid::prelude::*;
///
/// let config = GridConfig::new("orders")
///     .primary_key("id")
///     .selection_mode(SelectionMode::Multi)
///     .page_size(25);
/// assert_eq!(config.page_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Widget name, used as the key for persisted state.
    pub name: Option<String>,

    /// Declared columns. Any entry disables inference.
    pub columns: Vec<ColumnDef>,

    /// Field used for row identity when rows carry no synthetic id.
    pub primary_key: Option<String>,

    pub selection_mode: SelectionMode,

    pub page_size: usize,

    /// Rows sampled when inferring columns.
    pub sample_size: usize,

    /// Cap on inferred columns.
    pub max_columns: usize,

    /// Total width shared among columns.
    pub table_width: u32,

    pub expansion: ExpansionConfig,

    pub edit_mode: EditMode,

    /// Role a session needs before rows can be edited (None = anyone).
    pub edit_role: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            name: None,
            columns: Vec::new(),
            primary_key: None,
            selection_mode: SelectionMode::None,
            page_size: DEFAULT_PAGE_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_columns: DEFAULT_MAX_COLUMNS,
            table_width: DEFAULT_TABLE_WIDTH,
            expansion: ExpansionConfig::default(),
            edit_mode: EditMode::None,
            edit_role: None,
        }
    }
}

impl GridConfig {
    /// Create a config for a named grid.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Declare the columns.
    pub fn columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the primary key field.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Set the selection mode.
    pub fn selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Set rows per page. Zero is ignored.
    pub fn page_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.page_size = size;
        }
        self
    }

    /// Set the inference sample size and column cap.
    pub fn inference(mut self, sample_size: usize, max_columns: usize) -> Self {
        self.sample_size = sample_size;
        self.max_columns = max_columns;
        self
    }

    /// Set the total table width.
    pub fn table_width(mut self, width: u32) -> Self {
        self.table_width = width;
        self
    }

    /// Enable row expansion.
    pub fn expandable(mut self, close_others: bool) -> Self {
        self.expansion = ExpansionConfig {
            enabled: true,
            close_others,
        };
        self
    }

    /// Set the edit mode.
    pub fn edit_mode(mut self, mode: EditMode) -> Self {
        self.edit_mode = mode;
        self
    }

    /// Require a role for editing.
    pub fn edit_role(mut self, role: impl Into<String>) -> Self {
        self.edit_role = Some(role.into());
        self
    }

    /// Options for column inference.
    pub fn infer_options(&self) -> InferOptions {
        InferOptions {
            sample_size: self.sample_size,
            max_columns: self.max_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config: GridConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GridConfig::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let config: GridConfig = serde_json::from_str(
            r#"{
                "primaryKey": "id",
                "selectionMode": "radio",
                "pageSize": 5,
                "expansion": {"enabled": true, "closeOthers": true},
                "editMode": "quickEdit",
                "columns": [{"field": "name"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.primary_key.as_deref(), Some("id"));
        assert_eq!(config.selection_mode, SelectionMode::Single);
        assert_eq!(config.page_size, 5);
        assert!(config.expansion.close_others);
        assert_eq!(config.edit_mode, EditMode::QuickEdit);
        assert_eq!(config.columns.len(), 1);
        assert_eq!(config.max_columns, DEFAULT_MAX_COLUMNS);
    }

    #[test]
    fn test_zero_page_size_ignored() {
        assert_eq!(GridConfig::default().page_size(0).page_size, DEFAULT_PAGE_SIZE);
    }
}
