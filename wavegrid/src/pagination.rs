//! Page index and size over a caller-owned table state.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::Datasource;
use crate::edit::EditMode;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A table state object carrying a page window.
///
/// The caller owns it; the controller only reads it and issues updates.
pub trait TableState {
    fn page_index(&self) -> usize;
    fn page_size(&self) -> usize;
    fn set_page_index(&mut self, index: usize);
    fn set_page_size(&mut self, size: usize);
}

/// Plain page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageState {
    /// First page with the given size.
    pub fn with_size(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
        }
    }
}

impl TableState for PageState {
    fn page_index(&self) -> usize {
        self.page_index
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn set_page_index(&mut self, index: usize) {
        self.page_index = index;
    }

    fn set_page_size(&mut self, size: usize) {
        self.page_size = size;
    }
}

/// Where paging happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// The grid slices the full dataset.
    Client,
    /// The datasource returns one page at a time.
    Server,
}

/// Pagination logic for one grid.
#[derive(Debug)]
pub struct PaginationController<T: TableState = PageState> {
    table: T,
    datasource: Option<Arc<dyn Datasource>>,
    /// Page index at the last render, for detecting page moves.
    rendered_index: usize,
}

impl<T: TableState> PaginationController<T> {
    /// Create a controller over a table state.
    pub fn new(table: T) -> Self {
        let rendered_index = table.page_index();
        Self {
            table,
            datasource: None,
            rendered_index,
        }
    }

    /// Attach a server datasource.
    pub fn with_datasource(mut self, datasource: Arc<dyn Datasource>) -> Self {
        self.datasource = Some(datasource);
        self
    }

    /// Replace the datasource.
    pub fn set_datasource(&mut self, datasource: Option<Arc<dyn Datasource>>) {
        self.datasource = datasource;
    }

    /// The table state.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Current 0-based page index.
    pub fn page_index(&self) -> usize {
        self.table.page_index()
    }

    /// Current page size.
    pub fn page_size(&self) -> usize {
        self.table.page_size()
    }

    /// Whether paging is done by the datasource.
    pub fn mode(&self) -> PagingMode {
        match &self.datasource {
            Some(ds) if ds.is_server_paged() => PagingMode::Server,
            _ => PagingMode::Client,
        }
    }

    /// Number of pages for a dataset of `len` rows.
    pub fn page_count(&self, len: usize) -> usize {
        let total = match self.mode() {
            PagingMode::Server => self
                .datasource
                .as_ref()
                .and_then(|ds| ds.total_count())
                .unwrap_or(len),
            PagingMode::Client => len,
        };
        total.div_ceil(self.page_size().max(1))
    }

    /// Row offsets of the current page within a dataset of `len` rows.
    ///
    /// Server-paged datasets already hold exactly one page.
    pub fn page_range(&self, len: usize) -> Range<usize> {
        if self.mode() == PagingMode::Server {
            return 0..len;
        }
        let size = self.page_size().max(1);
        let start = self.page_index().saturating_mul(size).min(len);
        let end = start.saturating_add(size).min(len);
        start..end
    }

    /// Navigate to a 1-based page number.
    ///
    /// In quick-edit with client paging, a page starting past the end of the
    /// dataset redirects to the last page instead. Returns the new index when
    /// it changed.
    pub fn on_page_change(&mut self, target_page: usize, dataset_len: usize, edit_mode: EditMode) -> Option<usize> {
        let mut index = target_page.saturating_sub(1);
        if edit_mode == EditMode::QuickEdit && self.mode() == PagingMode::Client {
            let size = self.page_size().max(1);
            if index.saturating_mul(size) >= dataset_len {
                let last = dataset_len.div_ceil(size).saturating_sub(1);
                log::debug!("Page {} is past the end; redirecting to {}", index, last);
                index = last;
            }
        }
        if index == self.page_index() {
            return None;
        }
        self.table.set_page_index(index);
        Some(index)
    }

    /// Change the page size and return to the first page.
    ///
    /// Server-paged datasources get the new size as their result ceiling.
    /// The resulting fetch is the datasource's business; its rows arrive
    /// later through the host. A size of zero is ignored.
    pub fn on_page_size_change(&mut self, size: usize) -> bool {
        if size == 0 {
            return false;
        }
        self.sync_ceiling(size);
        let changed = size != self.page_size() || self.page_index() != 0;
        self.table.set_page_size(size);
        self.table.set_page_index(0);
        changed
    }

    /// Record the index that was just rendered.
    ///
    /// Returns true when it differs from the previous render, i.e. the
    /// visible page moved.
    pub fn mark_rendered(&mut self) -> bool {
        let index = self.page_index();
        let moved = index != self.rendered_index;
        self.rendered_index = index;
        moved
    }

    /// Pull a client-paged index back onto the last page after the dataset
    /// shrank. Returns the new index when it moved.
    pub fn clamp_to(&mut self, len: usize) -> Option<usize> {
        if self.mode() == PagingMode::Server {
            return None;
        }
        let last = self.page_count(len).saturating_sub(1);
        if self.page_index() <= last {
            return None;
        }
        self.table.set_page_index(last);
        Some(last)
    }

    /// Jump back to the first page without emitting a page move.
    pub fn reset(&mut self) {
        self.table.set_page_index(0);
        self.rendered_index = 0;
    }

    /// Restore a saved window. Returns the new index when it moved.
    ///
    /// A restored size reaches a server-paged datasource the same way a
    /// size change does.
    pub fn restore(&mut self, state: PageState) -> Option<usize> {
        if state.page_size > 0 {
            self.sync_ceiling(state.page_size);
            self.table.set_page_size(state.page_size);
        }
        if state.page_index == self.page_index() {
            return None;
        }
        self.table.set_page_index(state.page_index);
        Some(state.page_index)
    }

    fn sync_ceiling(&self, size: usize) {
        if let Some(ds) = &self.datasource
            && ds.is_server_paged()
        {
            ds.set_max_results(size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryDatasource;

    #[test]
    fn test_pages_are_one_based_in() {
        let mut pages = PaginationController::new(PageState::default());
        assert_eq!(pages.on_page_change(3, 100, EditMode::None), Some(2));
        assert_eq!(pages.page_range(100), 20..30);
        assert_eq!(pages.on_page_change(3, 100, EditMode::None), None);
    }

    #[test]
    fn test_quick_edit_redirects_past_end() {
        let mut pages = PaginationController::new(PageState::default());
        // Page 4 is index 3, rows 30..40 of 25.
        assert_eq!(pages.on_page_change(4, 25, EditMode::QuickEdit), Some(2));
        assert_eq!(pages.page_range(25), 20..25);
    }

    #[test]
    fn test_no_redirect_outside_quick_edit() {
        let mut pages = PaginationController::new(PageState::default());
        assert_eq!(pages.on_page_change(4, 25, EditMode::Inline), Some(3));
        assert!(pages.page_range(25).is_empty());
    }

    #[test]
    fn test_redirect_on_empty_dataset_stays_at_zero() {
        let mut pages = PaginationController::new(PageState::default());
        assert_eq!(pages.on_page_change(2, 0, EditMode::QuickEdit), None);
        assert_eq!(pages.page_index(), 0);
    }

    #[test]
    fn test_page_size_change_resets_index() {
        let mut pages = PaginationController::new(PageState::default());
        pages.on_page_change(3, 100, EditMode::None);
        assert!(pages.on_page_size_change(25));
        assert_eq!(pages.page_index(), 0);
        assert_eq!(pages.page_size(), 25);
        assert!(!pages.on_page_size_change(0));
    }

    #[test]
    fn test_server_paging_pushes_ceiling() {
        let source = Arc::new(MemoryDatasource::new(Vec::new(), 10));
        let mut pages = PaginationController::new(PageState::default()).with_datasource(source.clone());
        assert_eq!(pages.mode(), PagingMode::Server);
        pages.on_page_size_change(50);
        assert_eq!(source.max_results(), Some(50));
        assert_eq!(pages.page_range(7), 0..7);
    }

    #[test]
    fn test_restore_pushes_ceiling() {
        let source = Arc::new(MemoryDatasource::new(Vec::new(), 10));
        let mut pages = PaginationController::new(PageState::default()).with_datasource(source.clone());
        let moved = pages.restore(PageState {
            page_index: 2,
            page_size: 50,
        });
        assert_eq!(moved, Some(2));
        assert_eq!(pages.page_size(), 50);
        assert_eq!(source.max_results(), Some(50));
    }

    #[test]
    fn test_restore_same_index_is_not_a_move() {
        let mut pages = PaginationController::new(PageState::default());
        assert_eq!(pages.restore(PageState::default()), None);
        assert_eq!(
            pages.restore(PageState {
                page_index: 0,
                page_size: 0,
            }),
            None
        );
        assert_eq!(pages.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_server_quick_edit_does_not_redirect() {
        let source = Arc::new(MemoryDatasource::new(Vec::new(), 10));
        let mut pages = PaginationController::new(PageState::default()).with_datasource(source);
        assert_eq!(pages.on_page_change(5, 10, EditMode::QuickEdit), Some(4));
    }

    #[test]
    fn test_mark_rendered_detects_moves() {
        let mut pages = PaginationController::new(PageState::default());
        assert!(!pages.mark_rendered());
        pages.on_page_change(2, 100, EditMode::None);
        assert!(pages.mark_rendered());
        assert!(!pages.mark_rendered());
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut pages = PaginationController::new(PageState::default());
        pages.on_page_change(5, 100, EditMode::None);
        assert_eq!(pages.clamp_to(100), None);
        assert_eq!(pages.clamp_to(15), Some(1));
        assert_eq!(pages.clamp_to(0), Some(0));
    }

    #[test]
    fn test_page_count() {
        let pages = PaginationController::new(PageState::default());
        assert_eq!(pages.page_count(25), 3);
        assert_eq!(pages.page_count(0), 0);
    }
}
