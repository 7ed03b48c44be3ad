//! Grid events and the host listener surface.
//!
//! Before-hooks run synchronously and return a [`Decision`]. After-events are
//! queued and delivered when the host drains the queue, once the triggering
//! operation has fully settled.

use std::collections::VecDeque;

use serde_json::Value;

use crate::dataset::{Dataset, RowId};

/// Outcome of a cancelable before-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Proceed,
    Cancel,
}

impl Decision {
    /// Whether the hook let the operation go ahead.
    pub fn proceeds(self) -> bool {
        self == Decision::Proceed
    }
}

/// A settled state change.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    RowExpanded { row_id: RowId, row: Value },
    RowCollapsed { row_id: RowId, row: Value },
    PaginationChanged { page_index: usize },
    SelectionChanged { selected: Vec<RowId> },
    /// A pending new-row add was abandoned because the page moved.
    AddCanceled,
}

/// Host callbacks.
///
/// Every method has a no-op default, so listeners implement only what they
/// need.
pub trait GridListener {
    /// Runs before a row expands. Return [`Decision::Cancel`] to veto.
    fn before_row_expand(&mut self, _row_id: &RowId, _row: &Value, _dataset: &Dataset) -> Decision {
        Decision::Proceed
    }

    /// Runs before a row collapses. Return [`Decision::Cancel`] to veto.
    fn before_row_collapse(&mut self, _row_id: &RowId, _row: &Value, _dataset: &Dataset) -> Decision {
        Decision::Proceed
    }

    fn on_row_expand(&mut self, _row_id: &RowId, _row: &Value, _dataset: &Dataset) {}

    fn on_row_collapse(&mut self, _row_id: &RowId, _row: &Value, _dataset: &Dataset) {}

    fn on_pagination_change(&mut self, _page_index: usize) {}

    fn on_selection_change(&mut self, _selected: &[RowId]) {}

    fn on_add_canceled(&mut self) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default)]
pub struct NoopListener;

impl GridListener for NoopListener {}

/// Queue of after-events awaiting delivery.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GridEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: GridEvent) {
        log::trace!("queued {:?}", event);
        self.pending.push_back(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        self.pending.drain(..).collect()
    }

    /// Deliver every queued event to a listener.
    pub fn dispatch(&mut self, listener: &mut dyn GridListener, dataset: &Dataset) -> usize {
        let events = self.drain();
        let count = events.len();
        for event in events {
            match event {
                GridEvent::RowExpanded { row_id, row } => listener.on_row_expand(&row_id, &row, dataset),
                GridEvent::RowCollapsed { row_id, row } => listener.on_row_collapse(&row_id, &row, dataset),
                GridEvent::PaginationChanged { page_index } => listener.on_pagination_change(page_index),
                GridEvent::SelectionChanged { selected } => listener.on_selection_change(&selected),
                GridEvent::AddCanceled => listener.on_add_canceled(),
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pages(Vec<usize>);

    impl GridListener for Pages {
        fn on_pagination_change(&mut self, page_index: usize) {
            self.0.push(page_index);
        }
    }

    #[test]
    fn test_dispatch_in_order_and_empties_queue() {
        let mut queue = EventQueue::new();
        queue.push(GridEvent::PaginationChanged { page_index: 1 });
        queue.push(GridEvent::AddCanceled);
        queue.push(GridEvent::PaginationChanged { page_index: 2 });

        let mut listener = Pages::default();
        assert_eq!(queue.dispatch(&mut listener, &Dataset::empty()), 3);
        assert_eq!(listener.0, vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_default_hooks_proceed() {
        let mut listener = NoopListener;
        let decision = listener.before_row_expand(&RowId::Index(0), &Value::Null, &Dataset::empty());
        assert!(decision.proceeds());
    }
}
