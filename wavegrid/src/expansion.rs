//! Row expansion state with cancelable transitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dataset::RowId;
use crate::events::Decision;

/// Expansion feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpansionConfig {
    /// Whether rows can be expanded at all.
    pub enabled: bool,
    /// Expanding a row collapses every other row.
    pub close_others: bool,
}

/// Direction of an expansion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionAction {
    Expand,
    Collapse,
}

/// Set of expanded rows.
#[derive(Debug, Clone, Default)]
pub struct ExpansionController {
    config: ExpansionConfig,
    expanded: HashSet<RowId>,
}

impl ExpansionController {
    /// Create a controller with nothing expanded.
    pub fn new(config: ExpansionConfig) -> Self {
        Self {
            config,
            expanded: HashSet::new(),
        }
    }

    /// Feature switches.
    pub fn config(&self) -> ExpansionConfig {
        self.config
    }

    /// Check if a row is expanded.
    pub fn is_expanded(&self, id: &RowId) -> bool {
        self.expanded.contains(id)
    }

    /// Number of expanded rows.
    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Expanded identities in the given order.
    pub fn expanded_in<'a>(&self, order: &'a [RowId]) -> Vec<&'a RowId> {
        order.iter().filter(|id| self.expanded.contains(*id)).collect()
    }

    /// What toggling `id` would do.
    pub fn action_for(&self, id: &RowId) -> ExpansionAction {
        if self.expanded.contains(id) {
            ExpansionAction::Collapse
        } else {
            ExpansionAction::Expand
        }
    }

    /// Toggle a row.
    ///
    /// `before` is the cancelable hook; it sees the pending action and may
    /// veto it. Returns the applied action, or `None` for a collapse while the
    /// feature is off or when the hook canceled. Callers queue the
    /// after-event themselves.
    pub fn toggle<F>(&mut self, id: &RowId, before: F) -> Option<ExpansionAction>
    where
        F: FnOnce(ExpansionAction) -> Decision,
    {
        let action = self.action_for(id);
        if action == ExpansionAction::Collapse && !self.config.enabled {
            return None;
        }
        if !before(action).proceeds() {
            log::debug!("Row {} {:?} canceled by hook", id, action);
            return None;
        }
        match action {
            ExpansionAction::Expand => {
                if self.config.close_others {
                    self.expanded.clear();
                }
                self.expanded.insert(id.clone());
            }
            ExpansionAction::Collapse => {
                self.expanded.remove(id);
            }
        }
        Some(action)
    }

    /// Collapse every row.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget rows that are no longer in the dataset.
    pub fn retain_known(&mut self, known: &[RowId]) {
        let known: HashSet<&RowId> = known.iter().collect();
        self.expanded.retain(|id| known.contains(id));
    }
}
