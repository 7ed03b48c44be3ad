//! Row selection: radio and multi-select over the cell store.

use serde::{Deserialize, Serialize};

use crate::column::{ColumnDef, StructuralKind};
use crate::dataset::RowId;
use crate::edit::EditSession;
use crate::store::{CellStore, SelectionState};

/// Selection mode for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// No selection allowed.
    #[default]
    None,
    /// One row at a time (radio style).
    #[serde(alias = "radio")]
    Single,
    /// Any number of rows (checkbox style).
    #[serde(alias = "multiple")]
    Multi,
}

/// Tri-state of a "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// Selection logic for one grid.
///
/// Selection lives in the grid's [`CellStore`]; in single mode only
/// `selectedRowId` is populated, in multi mode only `selectedRowIds`.
#[derive(Debug, Clone)]
pub struct SelectionController {
    mode: SelectionMode,
    store: CellStore,
    /// Active row in single/none mode.
    active: Option<RowId>,
}

impl SelectionController {
    /// Create a controller over `store`.
    pub fn new(mode: SelectionMode, store: CellStore) -> Self {
        Self {
            mode,
            store,
            active: None,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch modes, clearing the selection and active row.
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        log::debug!("Selection mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.active = None;
        self.store.set_selection(&SelectionState::default());
        true
    }

    /// Current selection fields.
    pub fn state(&self) -> SelectionState {
        self.store.selection()
    }

    /// Selected identities, in selection order.
    pub fn selected_ids(&self) -> Vec<RowId> {
        let state = self.store.selection();
        match self.mode {
            SelectionMode::None => Vec::new(),
            SelectionMode::Single => state.selected_row_id.into_iter().collect(),
            SelectionMode::Multi => state.selected_row_ids,
        }
    }

    /// Check if a row is selected.
    pub fn is_selected(&self, id: &RowId) -> bool {
        let state = self.store.selection();
        match self.mode {
            SelectionMode::None => false,
            SelectionMode::Single => state.selected_row_id.as_ref() == Some(id),
            SelectionMode::Multi => state.selected_row_ids.contains(id),
        }
    }

    /// Handle a click on a row's selection control.
    ///
    /// Single mode selects unconditionally (there is no toggle-off); multi
    /// mode toggles membership. Returns whether the selection changed.
    pub fn click_control(&mut self, id: &RowId) -> bool {
        let mut state = self.store.selection();
        match self.mode {
            SelectionMode::None => return false,
            SelectionMode::Single => {
                state.selected_row_id = Some(id.clone());
                state.selected_row_ids.clear();
            }
            SelectionMode::Multi => {
                state.selected_row_id = None;
                if let Some(pos) = state.selected_row_ids.iter().position(|s| s == id) {
                    state.selected_row_ids.remove(pos);
                } else {
                    state.selected_row_ids.push(id.clone());
                }
            }
        }
        self.store.set_selection(&state)
    }

    /// Tri-state of the select-all control for the rows currently rendered.
    ///
    /// Only the rendered rows count: on a paged grid this reflects the
    /// visible page, not the whole dataset.
    pub fn select_all_state(&self, rendered: &[RowId]) -> CheckState {
        if self.mode != SelectionMode::Multi || rendered.is_empty() {
            return CheckState::Unchecked;
        }
        let selected = self.store.selection().selected_row_ids;
        let count = rendered.iter().filter(|id| selected.contains(id)).count();
        if count == 0 {
            CheckState::Unchecked
        } else if count == rendered.len() {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }

    /// Handle a click on the select-all control.
    ///
    /// When every rendered row is selected they are all deselected;
    /// otherwise every rendered row is selected. Rows outside `rendered`
    /// keep their state.
    pub fn toggle_all(&mut self, rendered: &[RowId]) -> bool {
        if self.mode != SelectionMode::Multi {
            return false;
        }
        let mut state = self.store.selection();
        if self.select_all_state(rendered) == CheckState::Checked {
            state.selected_row_ids.retain(|id| !rendered.contains(id));
        } else {
            for id in rendered {
                if !state.selected_row_ids.contains(id) {
                    state.selected_row_ids.push(id.clone());
                }
            }
        }
        self.store.set_selection(&state)
    }

    /// Handle a click anywhere on a row.
    ///
    /// Outside multi mode this moves the active row, unless a row is being
    /// edited or added. Returns whether the active row changed.
    pub fn click_row(&mut self, id: &RowId, edit: &EditSession) -> bool {
        if self.mode == SelectionMode::Multi || edit.blocks_active_row() {
            return false;
        }
        if self.active.as_ref() == Some(id) {
            return false;
        }
        self.active = Some(id.clone());
        true
    }

    /// Active rows: the selection set in multi mode, else the clicked row.
    pub fn active_rows(&self) -> Vec<RowId> {
        match self.mode {
            SelectionMode::Multi => self.selected_ids(),
            _ => self.active.iter().cloned().collect(),
        }
    }

    /// Whether a row is active.
    pub fn is_active(&self, id: &RowId) -> bool {
        match self.mode {
            SelectionMode::Multi => self.is_selected(id),
            _ => self.active.as_ref() == Some(id),
        }
    }

    /// Clear the selection and active row.
    pub fn clear(&mut self) -> bool {
        self.active = None;
        self.store.set_selection(&SelectionState::default())
    }

    /// Reinstate saved selected identities under the current mode.
    ///
    /// Single mode keeps only the first identity.
    pub fn restore(&mut self, ids: Vec<RowId>) -> bool {
        let state = match self.mode {
            SelectionMode::None => SelectionState::default(),
            SelectionMode::Single => SelectionState {
                selected_row_id: ids.into_iter().next(),
                selected_row_ids: Vec::new(),
            },
            SelectionMode::Multi => SelectionState {
                selected_row_id: None,
                selected_row_ids: ids,
            },
        };
        self.store.set_selection(&state)
    }

    /// The selection column this mode injects, if any.
    pub fn selection_column(&self) -> Option<ColumnDef> {
        match self.mode {
            SelectionMode::None => None,
            SelectionMode::Single => Some(ColumnDef::structural(StructuralKind::Radio)),
            SelectionMode::Multi => Some(ColumnDef::structural(StructuralKind::Select)),
        }
    }

    /// Prepend the selection column to a column list.
    ///
    /// Any selection column already present is dropped first so switching
    /// modes never leaves a stale control behind.
    pub fn inject_column(&self, columns: Vec<ColumnDef>) -> Vec<ColumnDef> {
        let data = columns.into_iter().filter(|c| {
            !matches!(
                c.structural_kind(),
                Some(StructuralKind::Select | StructuralKind::Radio)
            )
        });
        self.selection_column().into_iter().chain(data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditMode;

    fn ids(n: usize) -> Vec<RowId> {
        (1..=n).map(|i| RowId::key(i.to_string())).collect()
    }

    #[test]
    fn test_single_mode_has_no_toggle_off() {
        let mut selection = SelectionController::new(SelectionMode::Single, CellStore::new());
        let id = RowId::key("1");
        assert!(selection.click_control(&id));
        assert!(!selection.click_control(&id));
        assert_eq!(selection.selected_ids(), vec![id]);
    }

    #[test]
    fn test_multi_mode_toggles() {
        let mut selection = SelectionController::new(SelectionMode::Multi, CellStore::new());
        let rows = ids(2);
        selection.click_control(&rows[0]);
        selection.click_control(&rows[1]);
        selection.click_control(&rows[0]);
        assert_eq!(selection.selected_ids(), vec![rows[1].clone()]);
        assert_eq!(selection.state().selected_row_id, None);
    }

    #[test]
    fn test_select_all_tri_state_is_page_scoped() {
        let mut selection = SelectionController::new(SelectionMode::Multi, CellStore::new());
        let all = ids(6);
        let page = &all[0..3];
        selection.click_control(&all[4]);
        assert_eq!(selection.select_all_state(page), CheckState::Unchecked);
        selection.click_control(&all[0]);
        assert_eq!(selection.select_all_state(page), CheckState::Indeterminate);
        selection.click_control(&all[1]);
        selection.click_control(&all[2]);
        assert_eq!(selection.select_all_state(page), CheckState::Checked);
        assert_eq!(selection.select_all_state(&[]), CheckState::Unchecked);
    }

    #[test]
    fn test_toggle_all_keeps_off_page_rows() {
        let mut selection = SelectionController::new(SelectionMode::Multi, CellStore::new());
        let all = ids(4);
        selection.click_control(&all[3]);
        selection.toggle_all(&all[0..2]);
        assert_eq!(selection.selected_ids().len(), 3);
        selection.toggle_all(&all[0..2]);
        assert_eq!(selection.selected_ids(), vec![all[3].clone()]);
    }

    #[test]
    fn test_switching_to_single_clears_multi_set() {
        let mut selection = SelectionController::new(SelectionMode::Multi, CellStore::new());
        for id in ids(3) {
            selection.click_control(&id);
        }
        selection.set_mode(SelectionMode::Single);
        let state = selection.state();
        assert!(state.selected_row_ids.is_empty());
        assert!(state.selected_row_id.is_none());
        selection.click_control(&RowId::key("2"));
        assert_eq!(selection.state().selected_row_id, Some(RowId::key("2")));
        assert!(selection.state().selected_row_ids.is_empty());
    }

    #[test]
    fn test_active_row_suppressed_while_editing() {
        let store = CellStore::new();
        let mut selection = SelectionController::new(SelectionMode::None, store.clone());
        let mut edit = EditSession::new(EditMode::Inline, store);
        assert!(selection.click_row(&RowId::key("1"), &edit));
        edit.begin_edit(RowId::key("1"));
        assert!(!selection.click_row(&RowId::key("2"), &edit));
        assert_eq!(selection.active_rows(), vec![RowId::key("1")]);
    }

    #[test]
    fn test_active_rows_mirror_selection_in_multi_mode() {
        let store = CellStore::new();
        let mut selection = SelectionController::new(SelectionMode::Multi, store.clone());
        let edit = EditSession::new(EditMode::None, store);
        assert!(!selection.click_row(&RowId::key("1"), &edit));
        selection.click_control(&RowId::key("3"));
        assert_eq!(selection.active_rows(), vec![RowId::key("3")]);
    }

    #[test]
    fn test_restore_respects_mode() {
        let mut selection = SelectionController::new(SelectionMode::Single, CellStore::new());
        selection.restore(ids(3));
        assert_eq!(selection.selected_ids(), vec![RowId::key("1")]);
        assert!(selection.state().selected_row_ids.is_empty());
    }

    #[test]
    fn test_column_injection_follows_mode() {
        let mut selection = SelectionController::new(SelectionMode::Multi, CellStore::new());
        let columns = selection.inject_column(vec![ColumnDef::new("name")]);
        assert_eq!(columns[0].structural_kind(), Some(StructuralKind::Select));

        selection.set_mode(SelectionMode::Single);
        let columns = selection.inject_column(columns);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].structural_kind(), Some(StructuralKind::Radio));

        selection.set_mode(SelectionMode::None);
        assert_eq!(selection.inject_column(columns).len(), 1);
    }
}
