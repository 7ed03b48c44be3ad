//! Grid orchestrator.
//!
//! [`Grid`] wires the column model, selection, pagination, expansion and
//! edit overlay against one dataset snapshot. Every host interaction goes
//! through a method here; after-events are queued and delivered by
//! [`Grid::flush_events`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::column::{
    Breakpoint, ColumnDef, ColumnSet, ColumnSource, LayoutCache, StructuralKind, ViewportSource, build_columns,
    detect_breakpoint,
};
use crate::config::GridConfig;
use crate::dataset::{Dataset, Datasource, RowId};
use crate::edit::{EditMode, EditSession, RowPatch};
use crate::error::{GridError, Result};
use crate::events::{EventQueue, GridEvent, GridListener, NoopListener};
use crate::expansion::{ExpansionAction, ExpansionController};
use crate::pagination::{PageState, PaginationController, PagingMode};
use crate::render::{Cell, RowFlags, render_cell, toggle_checkbox};
use crate::selection::{CheckState, SelectionController, SelectionMode};
use crate::session::SessionContext;
use crate::sort::{SortDirection, SortState, sorted_indices};
use crate::store::CellStore;

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RowId,
    /// Position in the dataset.
    pub index: usize,
    pub cells: Vec<Cell>,
    pub selected: bool,
    pub active: bool,
    pub expanded: bool,
}

/// Everything a presentation layer needs to draw the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<RowView>,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub select_all: CheckState,
    pub adding: bool,
}

/// Grid state saved through the session's widget state handler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SavedState {
    page: PageState,
    selected: Vec<RowId>,
    sort: Option<SortState>,
}

/// A data grid bound to one dataset.
pub struct Grid {
    id: Uuid,
    config: GridConfig,
    dataset: Dataset,
    columns: ColumnSet,
    column_source: ColumnSource,
    layout: LayoutCache,
    breakpoint: Breakpoint,
    store: CellStore,
    selection: SelectionController,
    pagination: PaginationController,
    expansion: ExpansionController,
    edit: EditSession,
    sort: Option<SortState>,
    listener: Box<dyn GridListener>,
    events: EventQueue,
    session: Option<Arc<SessionContext>>,
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("rows", &self.dataset.len())
            .field("columns", &self.columns.columns().len())
            .field("breakpoint", &self.breakpoint)
            .field("selection", &self.selection.mode())
            .field("page", &self.pagination.table())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl Grid {
    /// Create a grid over a dataset.
    pub fn new(config: GridConfig, dataset: Dataset) -> Self {
        let model = build_columns(&config.columns, &dataset, config.infer_options());
        let store = CellStore::new();
        let id = Uuid::new_v4();
        log::debug!(
            "Grid {} created: {} rows, {} {:?} columns",
            id,
            dataset.len(),
            model.columns.len(),
            model.source
        );
        Self {
            id,
            selection: SelectionController::new(config.selection_mode, store.clone()),
            pagination: PaginationController::new(PageState::with_size(config.page_size)),
            expansion: ExpansionController::new(config.expansion),
            edit: EditSession::new(config.edit_mode, store.clone()),
            columns: ColumnSet::new(model.columns),
            column_source: model.source,
            layout: LayoutCache::new(),
            breakpoint: Breakpoint::default(),
            sort: None,
            listener: Box::new(NoopListener),
            events: EventQueue::new(),
            session: None,
            store,
            dataset,
            config,
        }
    }

    /// Create a grid from raw JSON rows.
    pub fn from_value(config: GridConfig, rows: Value) -> Self {
        let dataset = Dataset::from_value(rows, config.primary_key.as_deref());
        Self::new(config, dataset)
    }

    /// Read the viewport once and fix the breakpoint.
    pub fn with_viewport(mut self, viewport: &dyn ViewportSource) -> Self {
        self.breakpoint = detect_breakpoint(viewport);
        self
    }

    /// Install the host listener.
    pub fn with_listener(mut self, listener: impl GridListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    /// Page through a server datasource.
    pub fn with_datasource(mut self, datasource: Arc<dyn Datasource>) -> Self {
        if datasource.is_server_paged() {
            datasource.set_max_results(self.pagination.page_size());
        }
        self.pagination.set_datasource(Some(datasource));
        self
    }

    /// Attach the session context.
    pub fn with_session(mut self, session: Arc<SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// The grid's cell store.
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn expansion(&self) -> &ExpansionController {
        &self.expansion
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Whether columns are inferred from data.
    pub fn is_dynamic(&self) -> bool {
        self.column_source == ColumnSource::Dynamic
    }

    /// Configured columns, before injection and layout.
    pub fn column_set(&self) -> &ColumnSet {
        &self.columns
    }

    // -------------------------------------------------------------------------
    // Dataset
    // -------------------------------------------------------------------------

    /// Replace the rows, deriving identities with the configured key.
    pub fn set_rows(&mut self, rows: Arc<Vec<Value>>) -> bool {
        let dataset = Dataset::new(rows, self.config.primary_key.as_deref());
        self.set_dataset(dataset)
    }

    /// Install a new dataset snapshot.
    ///
    /// The same snapshot is a no-op. Inferred columns are rebuilt for every
    /// new snapshot; selection and expansion are rebuilt only when the
    /// length or identity set changed. Returns whether anything was
    /// installed.
    pub fn set_dataset(&mut self, dataset: Dataset) -> bool {
        if dataset.same_snapshot(&self.dataset) {
            return false;
        }
        let reshaped = !dataset.same_shape(&self.dataset);
        self.dataset = dataset;

        if self.column_source == ColumnSource::Dynamic {
            let model = build_columns(&self.config.columns, &self.dataset, self.config.infer_options());
            self.columns.replace(model.columns);
        }

        if reshaped {
            log::debug!("Grid {} dataset reshaped to {} rows", self.id, self.dataset.len());
            let had_selection = !self.selection.selected_ids().is_empty();
            self.selection.clear();
            if had_selection {
                self.events.push(GridEvent::SelectionChanged { selected: Vec::new() });
            }
            self.expansion.retain_known(self.dataset.ids());
            if let Some(index) = self.pagination.clamp_to(self.dataset.len()) {
                self.events.push(GridEvent::PaginationChanged { page_index: index });
                self.sync_rendered_page();
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Columns and rendering
    // -------------------------------------------------------------------------

    /// Columns as rendered: selection and expand controls injected, widths
    /// distributed, hidden columns removed.
    pub fn columns(&mut self) -> Vec<ColumnDef> {
        let mut columns = self.columns.columns().to_vec();
        if self.expansion.config().enabled
            && !columns
                .iter()
                .any(|c| c.structural_kind() == Some(StructuralKind::Expand))
        {
            columns.insert(0, ColumnDef::structural(StructuralKind::Expand));
        }
        let columns = self.selection.inject_column(columns);
        self.layout
            .layout(self.columns.version(), &columns, self.config.table_width, self.breakpoint)
    }

    /// Dataset positions of the rows on the current page, in display order.
    pub fn rendered_indices(&self) -> Vec<usize> {
        let order = sorted_indices(&self.dataset, self.sort.as_ref());
        let range = self.pagination.page_range(order.len());
        order[range].to_vec()
    }

    /// Identities of the rows on the current page.
    pub fn rendered_ids(&self) -> Vec<RowId> {
        self.rendered_indices()
            .into_iter()
            .filter_map(|i| self.dataset.id(i).cloned())
            .collect()
    }

    /// Build the current page.
    pub fn view(&mut self) -> GridView {
        self.sync_rendered_page();
        let columns = self.columns();
        let page: Vec<(usize, RowId)> = self
            .rendered_indices()
            .into_iter()
            .filter_map(|i| self.dataset.id(i).map(|id| (i, id.clone())))
            .collect();
        let rows = page
            .iter()
            .map(|(index, id)| {
                let index = *index;
                let row = self.dataset.row(index).unwrap_or(&Value::Null);
                let flags = RowFlags {
                    index,
                    selected: self.selection.is_selected(id),
                    expanded: self.expansion.is_expanded(id),
                };
                RowView {
                    id: id.clone(),
                    index,
                    cells: columns
                        .iter()
                        .map(|column| render_cell(column, id, row, flags, &self.edit))
                        .collect(),
                    selected: flags.selected,
                    active: self.selection.is_active(id),
                    expanded: flags.expanded,
                }
            })
            .collect();

        let ids: Vec<RowId> = page.into_iter().map(|(_, id)| id).collect();
        GridView {
            columns,
            rows,
            page_index: self.pagination.page_index(),
            page_size: self.pagination.page_size(),
            page_count: self.pagination.page_count(self.dataset.len()),
            total_rows: self.dataset.len(),
            select_all: self.selection.select_all_state(&ids),
            adding: self.edit.is_adding(),
        }
    }

    /// Record the rendered page; a page move abandons any pending add.
    fn sync_rendered_page(&mut self) {
        if self.pagination.mark_rendered() && self.edit.cancel_add() {
            self.events.push(GridEvent::AddCanceled);
        }
    }

    /// Override one property of one configured column.
    pub fn apply_column_override(&mut self, index: usize, key: &str, value: Value) -> Result<()> {
        self.columns.apply_override(index, key, value)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    fn selection_changed(&mut self) {
        self.events.push(GridEvent::SelectionChanged {
            selected: self.selection.selected_ids(),
        });
    }

    /// Click a row's selection control.
    pub fn click_row_control(&mut self, id: &RowId) -> bool {
        let changed = self.selection.click_control(id);
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Click anywhere on a row. Returns whether the active row moved.
    pub fn click_row(&mut self, id: &RowId) -> bool {
        self.selection.click_row(id, &self.edit)
    }

    /// Click the select-all control for the current page.
    pub fn toggle_select_all(&mut self) -> bool {
        let rendered = self.rendered_ids();
        let changed = self.selection.toggle_all(&rendered);
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Switch the selection mode, clearing the selection.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> bool {
        let had_selection = !self.selection.selected_ids().is_empty();
        let changed = self.selection.set_mode(mode);
        if changed && had_selection {
            self.selection_changed();
        }
        changed
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) -> bool {
        let had_selection = !self.selection.selected_ids().is_empty();
        self.selection.clear();
        if had_selection {
            self.selection_changed();
        }
        had_selection
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Navigate to a 1-based page.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        let Some(index) = self
            .pagination
            .on_page_change(page, self.dataset.len(), self.edit.mode())
        else {
            return false;
        };
        self.events.push(GridEvent::PaginationChanged { page_index: index });
        self.sync_rendered_page();
        true
    }

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if !self.pagination.on_page_size_change(size) {
            return false;
        }
        self.events.push(GridEvent::PaginationChanged { page_index: 0 });
        self.sync_rendered_page();
        true
    }

    /// Where paging happens.
    pub fn paging_mode(&self) -> PagingMode {
        self.pagination.mode()
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    /// Toggle a row's expansion.
    ///
    /// The listener's before-hook may cancel. Returns the applied action,
    /// or `None` for a canceled toggle or a collapse while expansion is
    /// disabled.
    pub fn toggle_row_expansion(&mut self, id: &RowId) -> Result<Option<ExpansionAction>> {
        let row = self
            .dataset
            .row_by_id(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?;
        let listener = &mut self.listener;
        let dataset = &self.dataset;
        let applied = self.expansion.toggle(id, |action| match action {
            ExpansionAction::Expand => listener.before_row_expand(id, row, dataset),
            ExpansionAction::Collapse => listener.before_row_collapse(id, row, dataset),
        });
        if let Some(action) = applied {
            let row_id = id.clone();
            let row = row.clone();
            self.events.push(match action {
                ExpansionAction::Expand => GridEvent::RowExpanded { row_id, row },
                ExpansionAction::Collapse => GridEvent::RowCollapsed { row_id, row },
            });
        }
        Ok(applied)
    }

    /// Collapse every row.
    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Order the view by a sortable data column.
    pub fn sort_by(&mut self, field: &str, direction: SortDirection) -> bool {
        let sortable = self
            .columns
            .columns()
            .iter()
            .any(|c| c.field == field && c.sortable && c.is_data());
        if !sortable {
            log::debug!("Grid {} ignoring sort on '{}'", self.id, field);
            return false;
        }
        self.sort = Some(SortState {
            field: field.to_string(),
            direction,
        });
        true
    }

    /// Return to dataset order.
    pub fn clear_sort(&mut self) -> bool {
        self.sort.take().is_some()
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Whether the session may edit rows.
    ///
    /// A configured edit role needs a session that grants it.
    pub fn can_edit(&self) -> bool {
        match &self.config.edit_role {
            None => true,
            Some(role) => self.session.as_ref().is_some_and(|s| s.is_allowed(role)),
        }
    }

    /// Switch the edit mode. Leaving edit mode discards pending values.
    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit.set_mode(mode);
    }

    /// Start editing a row.
    pub fn begin_edit(&mut self, id: &RowId) -> Result<bool> {
        if self.dataset.index_of(id).is_none() {
            return Err(GridError::RowNotFound(id.clone()));
        }
        Ok(self.can_edit() && self.edit.begin_edit(id.clone()))
    }

    /// Start adding a new row.
    pub fn begin_add(&mut self) -> bool {
        self.can_edit() && self.edit.begin_add()
    }

    /// Stage a pending value for a cell.
    pub fn stage_edit(&mut self, id: &RowId, field: &str, value: Value) -> bool {
        self.can_edit() && self.edit.stage(id, field, value)
    }

    /// Flip a checkbox cell through the overlay.
    pub fn toggle_checkbox(&mut self, id: &RowId, field: &str) -> Result<bool> {
        let row = self
            .dataset
            .row_by_id(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?;
        if !self.can_edit() {
            return Ok(false);
        }
        Ok(self
            .columns
            .columns()
            .iter()
            .find(|c| c.field == field)
            .is_some_and(|column| toggle_checkbox(column, id, row, &self.edit)))
    }

    /// Commit the overlay, returning new row values for the caller to apply.
    pub fn commit_edits(&mut self) -> Vec<RowPatch> {
        self.edit.commit(&self.dataset)
    }

    /// Discard the overlay.
    pub fn cancel_edits(&mut self) {
        self.edit.cancel();
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Deliver queued after-events to the listener.
    pub fn flush_events(&mut self) -> usize {
        self.events.dispatch(self.listener.as_mut(), &self.dataset)
    }

    /// Take queued after-events without delivering them.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    // -------------------------------------------------------------------------
    // Persisted state
    // -------------------------------------------------------------------------

    /// Save page, selection and sort under the grid's name.
    ///
    /// Needs both a session and a configured name.
    pub fn save_state(&self) -> bool {
        let (Some(session), Some(name)) = (&self.session, &self.config.name) else {
            return false;
        };
        let saved = SavedState {
            page: PageState {
                page_index: self.pagination.page_index(),
                page_size: self.pagination.page_size(),
            },
            selected: self.selection.selected_ids(),
            sort: self.sort.clone(),
        };
        match serde_json::to_value(&saved) {
            Ok(value) => {
                session.state().set_widget_state(name, value);
                true
            }
            Err(e) => {
                log::warn!("Grid {} state not saved: {}", self.id, e);
                false
            }
        }
    }

    /// Restore state saved by [`Grid::save_state`].
    ///
    /// Returns false when nothing was saved. Saved state that no longer
    /// decodes is an error; saved state with an unexpected shape is
    /// ignored.
    pub fn restore_state(&mut self) -> Result<bool> {
        let (Some(session), Some(name)) = (&self.session, &self.config.name) else {
            return Ok(false);
        };
        let Some(value) = session.state().get_widget_state(name)? else {
            return Ok(false);
        };
        let saved: SavedState = match serde_json::from_value(value) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Grid {} ignoring saved state: {}", self.id, e);
                return Ok(false);
            }
        };
        if let Some(index) = self.pagination.restore(saved.page) {
            self.events.push(GridEvent::PaginationChanged { page_index: index });
            self.sync_rendered_page();
        }
        let known: Vec<RowId> = saved
            .selected
            .into_iter()
            .filter(|id| self.dataset.index_of(id).is_some())
            .collect();
        self.selection.restore(known);
        self.sort = saved
            .sort
            .filter(|s| self.columns.columns().iter().any(|c| c.field == s.field && c.sortable));
        log::debug!("Grid {} restored state", self.id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Value {
        Value::Array((1..=n).map(|i| json!({"id": i, "name": format!("Row {}", i)})).collect())
    }

    #[test]
    fn test_view_pages_rows() {
        let mut grid = Grid::from_value(GridConfig::default().primary_key("id"), rows(25));
        let view = grid.view();
        assert_eq!(view.rows.len(), 10);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.rows[0].id, RowId::key("1"));
        assert_eq!(view.columns.len(), 2);
    }

    #[test]
    fn test_same_snapshot_is_ignored() {
        let mut grid = Grid::from_value(GridConfig::default(), rows(3));
        let same = grid.dataset().clone();
        assert!(!grid.set_dataset(same));
    }

    #[test]
    fn test_sort_requires_sortable_column() {
        let config = GridConfig::default().columns(vec![
            ColumnDef::new("id"),
            ColumnDef::new("name").unsortable(),
        ]);
        let mut grid = Grid::from_value(config, rows(3));
        assert!(grid.sort_by("id", SortDirection::Desc));
        assert_eq!(grid.rendered_indices(), vec![2, 1, 0]);
        assert!(!grid.sort_by("name", SortDirection::Asc));
        assert!(!grid.sort_by("missing", SortDirection::Asc));
    }

    #[test]
    fn test_sorted_view_pairs_ids_with_rows() {
        let config = GridConfig::default().primary_key("id").page_size(2);
        let mut grid = Grid::from_value(config, rows(5));
        grid.sort_by("id", SortDirection::Desc);
        grid.go_to_page(2);
        let view = grid.view();
        let pairs: Vec<(RowId, usize)> = view.rows.iter().map(|r| (r.id.clone(), r.index)).collect();
        assert_eq!(pairs, vec![(RowId::key("3"), 2), (RowId::key("2"), 1)]);
        assert_eq!(view.rows[0].cells[1].text(), "Row 3");
    }

    #[test]
    fn test_edit_role_needs_session() {
        let config = GridConfig::default().edit_mode(EditMode::Inline).edit_role("editor");
        let mut grid = Grid::from_value(config.clone(), rows(1));
        assert!(!grid.begin_add());

        let session = Arc::new(SessionContext::new(|role| role == "editor"));
        let mut grid = Grid::from_value(config, rows(1)).with_session(session);
        assert!(grid.begin_add());
    }

    #[test]
    fn test_unknown_row_is_an_error() {
        let mut grid = Grid::from_value(GridConfig::default().expandable(false), rows(1));
        assert_eq!(
            grid.toggle_row_expansion(&RowId::key("nope")),
            Err(GridError::RowNotFound(RowId::key("nope")))
        );
    }
}
