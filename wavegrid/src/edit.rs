//! Inline and quick-edit sessions over the cell edit overlay.
//!
//! Pending values live in the grid's [`CellStore`] under `cells`, never in
//! the caller's rows. Committing produces fresh row values for the caller to
//! apply; cancelling discards the overlay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dataset::{Dataset, RowId};
use crate::store::CellStore;

/// Row editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditMode {
    /// Rows are read-only.
    #[default]
    None,
    /// One row at a time is edited in place.
    Inline,
    /// Every editable cell is live; values stay in the overlay until commit.
    QuickEdit,
}

/// A committed row value the caller should write back to its dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPatch {
    pub id: RowId,
    /// Position in the dataset, or `None` for a newly added row.
    pub index: Option<usize>,
    /// The full row with pending values applied.
    pub row: Value,
}

/// Edit state for one grid.
#[derive(Debug, Clone)]
pub struct EditSession {
    mode: EditMode,
    editing_row: Option<RowId>,
    adding: bool,
    store: CellStore,
}

impl EditSession {
    /// Create a session writing its overlay into `store`.
    pub fn new(mode: EditMode, store: CellStore) -> Self {
        Self {
            mode,
            editing_row: None,
            adding: false,
            store,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Whether quick-edit is on.
    pub fn is_quick_edit(&self) -> bool {
        self.mode == EditMode::QuickEdit
    }

    /// Whether the overlay is live.
    pub fn is_active(&self) -> bool {
        self.mode != EditMode::None
    }

    /// Switch modes. Leaving edit mode discards pending values.
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        log::debug!("Edit mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        if mode == EditMode::None {
            self.cancel();
        }
    }

    /// Row currently being edited.
    pub fn editing_row(&self) -> Option<&RowId> {
        self.editing_row.as_ref()
    }

    /// Whether a new row is being added.
    pub fn is_adding(&self) -> bool {
        self.adding
    }

    /// Whether a click on a row should leave the active row alone.
    pub fn blocks_active_row(&self) -> bool {
        self.adding || self.editing_row.is_some()
    }

    /// Start editing a row. Returns false when editing is off.
    pub fn begin_edit(&mut self, row: RowId) -> bool {
        if !self.is_active() {
            return false;
        }
        self.editing_row = Some(row);
        true
    }

    /// Start adding a new row. Returns false when editing is off.
    pub fn begin_add(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.adding = true;
        true
    }

    /// Abandon a pending add. Returns whether one was in progress.
    pub fn cancel_add(&mut self) -> bool {
        if !self.adding {
            return false;
        }
        self.adding = false;
        self.store.remove_row_cells(&RowId::new_row());
        log::debug!("New row add canceled");
        true
    }

    /// Stage a pending value. Ignored when editing is off.
    pub fn stage(&self, row: &RowId, field: &str, value: Value) -> bool {
        if !self.is_active() {
            return false;
        }
        self.store.set_cell_value(row, field, value)
    }

    /// Pending value for a cell, if any.
    pub fn pending(&self, row: &RowId, field: &str) -> Option<Value> {
        if !self.is_active() {
            return None;
        }
        self.store.cell_value(row, field)
    }

    /// Effective value of a cell: the overlay first, then the row itself.
    pub fn effective_value(&self, row_id: &RowId, row: &Value, field: &str) -> Value {
        self.pending(row_id, field)
            .or_else(|| row.get(field).cloned())
            .unwrap_or(Value::Null)
    }

    /// Build patched copies of every row with pending values, then clear the
    /// overlay and end any edit or add in progress.
    ///
    /// Pending values for rows no longer in the dataset are dropped. Only
    /// the row being added yields a patch without an index.
    pub fn commit(&mut self, dataset: &Dataset) -> Vec<RowPatch> {
        let positions: HashMap<String, usize> = dataset
            .ids()
            .iter()
            .enumerate()
            .map(|(i, id)| (id.store_key(), i))
            .collect();
        let new_key = RowId::new_row().store_key();

        let mut patches = Vec::new();
        for (key, fields) in self.store.all_cells() {
            let Some(fields) = fields.as_object().filter(|f| !f.is_empty()) else {
                continue;
            };
            let (id, index, mut row) = if key == new_key {
                (RowId::new_row(), None, Value::Object(Map::new()))
            } else if let Some(&i) = positions.get(&key)
                && let (Some(id), Some(row)) = (dataset.id(i), dataset.row(i))
            {
                (id.clone(), Some(i), row.clone())
            } else {
                log::warn!("Dropping pending values for missing row '{}'", key);
                continue;
            };
            if let Some(target) = row.as_object_mut() {
                for (field, value) in fields {
                    target.insert(field.clone(), value.clone());
                }
            }
            patches.push(RowPatch { id, index, row });
        }
        log::debug!("Committed {} row patches", patches.len());
        self.cancel();
        patches
    }

    /// Discard the overlay and end any edit or add in progress.
    pub fn cancel(&mut self) {
        self.store.clear_cells();
        self.editing_row = None;
        self.adding = false;
    }
}
