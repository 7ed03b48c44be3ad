//! Path-addressed cell state store.
//!
//! Each grid owns one [`CellStore`]. It holds a JSON tree shaped as
//!
//! ```text
//! { cells: { <rowKey>: { <field>: value } },
//!   selection: { selectedRowId: id | null, selectedRowIds: [id] } }
//! ```
//!
//! Paths use dot and bracket accessors (`cells.5.active`,
//! `selection.selectedRowIds[0]`). Callers outside the engine should prefer
//! the typed accessors, which never build path strings.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::dataset::RowId;

/// Errors from path-addressed store access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The path string could not be parsed.
    #[error("Invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A path step tried to descend into a scalar value.
    #[error("Cannot descend into scalar at '{path}'")]
    NotAContainer { path: String },

    /// An index lies too far past the end of its array to pad up to.
    #[error("Index {index} at '{path}' is out of range for length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

/// How many null slots a single assignment may pad an array with.
pub const MAX_ARRAY_PAD: usize = 1024;

/// One step of a store path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed store path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The empty path, addressing the whole state.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a key step.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::Key(key.into()));
        self
    }

    /// Append an index step.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    /// The steps of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    fn cell(row: &RowId, field: &str) -> Self {
        Self::root().key("cells").key(row.store_key()).key(field)
    }

    fn row_cells(row: &RowId) -> Self {
        Self::root().key("cells").key(row.store_key())
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| StoreError::InvalidPath {
            path: s.to_string(),
            reason,
        };
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self(segments));
        }

        let mut chars = s.chars().peekable();
        let mut key = String::new();
        // True right after a `]`, where a key may only follow a `.`.
        let mut after_index = false;
        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(invalid("empty key"));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    after_index = false;
                    if chars.peek().is_none() {
                        return Err(invalid("trailing '.'"));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    } else if segments.is_empty() {
                        return Err(invalid("index without a key"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("non-numeric index")),
                            None => return Err(invalid("unclosed '['")),
                        }
                    }
                    let index = digits.parse().map_err(|_| invalid("empty index"))?;
                    segments.push(Segment::Index(index));
                    after_index = true;
                }
                ']' => return Err(invalid("unexpected ']'")),
                _ => {
                    if after_index {
                        return Err(invalid("expected '.' after index"));
                    }
                    key.push(ch);
                }
            }
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        Ok(Self(segments))
    }
}

/// Anything that can address the store.
pub trait IntoPath {
    fn into_path(self) -> Result<Path, StoreError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, StoreError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, StoreError> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path, StoreError> {
        self.parse()
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Path, StoreError> {
        self.parse()
    }
}

// =============================================================================
// Tree navigation
// =============================================================================

fn lookup<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.0.iter().try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.as_object()?.get(key),
        Segment::Index(index) => node.as_array()?.get(*index),
    })
}

fn assign(root: &mut Value, path: &Path, value: Value) -> Result<(), StoreError> {
    let mut node = root;
    for segment in &path.0 {
        if node.is_null() {
            *node = match segment {
                Segment::Key(_) => Value::Object(Map::new()),
                Segment::Index(_) => Value::Array(Vec::new()),
            };
        }
        node = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.entry(key.clone()).or_insert(Value::Null),
            (Segment::Index(index), Value::Array(items)) => {
                let len = items.len();
                if len <= *index {
                    let new_len = index
                        .checked_add(1)
                        .filter(|n| n - len <= MAX_ARRAY_PAD)
                        .ok_or_else(|| StoreError::IndexOutOfRange {
                            path: path.to_string(),
                            index: *index,
                            len,
                        })?;
                    items.resize(new_len, Value::Null);
                }
                &mut items[*index]
            }
            _ => {
                return Err(StoreError::NotAContainer {
                    path: path.to_string(),
                });
            }
        };
    }
    *node = value;
    Ok(())
}

fn detach(root: &mut Value, path: &Path) -> Option<Value> {
    let (last, parents) = path.0.split_last()?;
    let mut node = root;
    for segment in parents {
        node = match segment {
            Segment::Key(key) => node.as_object_mut()?.get_mut(key)?,
            Segment::Index(index) => node.as_array_mut()?.get_mut(*index)?,
        };
    }
    match last {
        Segment::Key(key) => node.as_object_mut()?.remove(key),
        Segment::Index(index) => {
            let items = node.as_array_mut()?;
            (*index < items.len()).then(|| items.remove(*index))
        }
    }
}

fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

// =============================================================================
// Selection snapshot
// =============================================================================

/// Selection fields as stored under `selection`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionState {
    pub selected_row_id: Option<RowId>,
    pub selected_row_ids: Vec<RowId>,
}

fn initial_state() -> Value {
    json!({
        "cells": {},
        "selection": { "selectedRowId": null, "selectedRowIds": [] }
    })
}

// =============================================================================
// Store
// =============================================================================

/// Per-grid key/value store with change tracking.
///
/// Cloning shares the same state. Writes that leave the tree deep-equal to
/// its prior value do not bump [`version`](CellStore::version), so renders
/// keyed on the version are not invalidated needlessly.
#[derive(Debug, Clone)]
pub struct CellStore {
    inner: Arc<RwLock<Value>>,
    version: Arc<AtomicU64>,
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore {
    /// Create a store with empty cells and selection.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial_state())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of effective writes so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Path access
    // -------------------------------------------------------------------------

    /// Value at `path`, or `default` when nothing is stored there.
    pub fn get(&self, path: impl IntoPath, default: Value) -> Result<Value, StoreError> {
        let path = path.into_path()?;
        Ok(lookup(&self.read(), &path).cloned().unwrap_or(default))
    }

    /// Store `value` at `path`. Returns whether anything changed.
    pub fn set(&self, path: impl IntoPath, value: Value) -> Result<bool, StoreError> {
        let path = path.into_path()?;
        let mut guard = self.write();
        if lookup(&guard, &path) == Some(&value) {
            return Ok(false);
        }
        log::trace!("store set {}", path);
        assign(&mut guard, &path, value)?;
        self.bump();
        Ok(true)
    }

    /// Whether a value is stored at `path`.
    pub fn has(&self, path: impl IntoPath) -> Result<bool, StoreError> {
        let path = path.into_path()?;
        Ok(lookup(&self.read(), &path).is_some())
    }

    /// Remove the value at `path`. Returns whether anything was removed.
    pub fn remove(&self, path: impl IntoPath) -> Result<bool, StoreError> {
        let path = path.into_path()?;
        let removed = detach(&mut self.write(), &path).is_some();
        if removed {
            log::trace!("store remove {}", path);
            self.bump();
        }
        Ok(removed)
    }

    /// Deep-merge an object patch into the state.
    pub fn update(&self, patch: Value) -> bool {
        self.update_with(|state| deep_merge(state, patch))
    }

    /// Mutate the state through a closure.
    pub fn update_with<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        let mut guard = self.write();
        let before = guard.clone();
        f(&mut *guard);
        let changed = *guard != before;
        if changed {
            self.bump();
        }
        changed
    }

    // -------------------------------------------------------------------------
    // Whole state
    // -------------------------------------------------------------------------

    /// A copy of the whole state.
    pub fn state(&self) -> Value {
        self.read().clone()
    }

    /// Replace the whole state.
    pub fn replace(&self, state: Value) -> bool {
        let mut guard = self.write();
        if *guard == state {
            return false;
        }
        *guard = state;
        self.bump();
        true
    }

    /// Reset to empty cells and selection.
    pub fn clear(&self) -> bool {
        self.replace(initial_state())
    }

    // -------------------------------------------------------------------------
    // Cell accessors
    // -------------------------------------------------------------------------

    /// Pending value for one cell.
    pub fn cell_value(&self, row: &RowId, field: &str) -> Option<Value> {
        lookup(&self.read(), &Path::cell(row, field)).cloned()
    }

    /// Stage a value for one cell.
    pub fn set_cell_value(&self, row: &RowId, field: &str, value: Value) -> bool {
        // Cell paths always descend through objects the store created itself.
        self.set(Path::cell(row, field), value).unwrap_or(false)
    }

    /// Whether a cell has a pending value.
    pub fn has_cell_value(&self, row: &RowId, field: &str) -> bool {
        lookup(&self.read(), &Path::cell(row, field)).is_some()
    }

    /// Drop one cell's pending value.
    pub fn remove_cell_value(&self, row: &RowId, field: &str) -> bool {
        self.remove(Path::cell(row, field)).unwrap_or(false)
    }

    /// All pending values for one row.
    pub fn row_cells(&self, row: &RowId) -> Option<Map<String, Value>> {
        lookup(&self.read(), &Path::row_cells(row))
            .and_then(Value::as_object)
            .cloned()
    }

    /// Drop every pending value for one row.
    pub fn remove_row_cells(&self, row: &RowId) -> bool {
        self.remove(Path::row_cells(row)).unwrap_or(false)
    }

    /// All pending values, keyed by row store key.
    pub fn all_cells(&self) -> Map<String, Value> {
        self.read()
            .get("cells")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every pending cell value.
    pub fn clear_cells(&self) -> bool {
        self.set(Path::root().key("cells"), Value::Object(Map::new()))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Selection accessors
    // -------------------------------------------------------------------------

    /// Current selection fields.
    pub fn selection(&self) -> SelectionState {
        self.read()
            .get("selection")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Overwrite the selection fields.
    pub fn set_selection(&self, selection: &SelectionState) -> bool {
        let value = serde_json::to_value(selection).unwrap_or(Value::Null);
        self.set(Path::root().key("selection"), value).unwrap_or(false)
    }
}
