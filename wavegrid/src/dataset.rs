//! Dataset snapshots, row identity and the external datasource boundary.
//!
//! The grid never owns rows. A [`Dataset`] is a cheap, shared, read-only view
//! over the caller's rows together with the identities derived for them when
//! the snapshot was installed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Synthetic row-id field the runtime stamps on rows it tracks.
pub const ROW_ID_FIELD: &str = "_wmTableRowId";

/// Stable identity of a row within a dataset snapshot.
///
/// Serialized untagged: `Key` as a JSON string, `Index` as a JSON number and
/// `New` as null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Identity taken from a row field (synthetic id or primary key).
    Key(String),
    /// Positional fallback for rows without a usable key.
    Index(usize),
    /// A row that is being added and has no data yet.
    New,
}

impl RowId {
    /// Create a key identity.
    pub fn key(value: impl Into<String>) -> Self {
        Self::Key(value.into())
    }

    /// Identity reserved for a row that is being added.
    pub fn new_row() -> Self {
        Self::New
    }

    /// Whether this is the row being added.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    /// Key used to address this row inside the cell store.
    ///
    /// Plain keys are stored as-is. Positions become `#n`, the new row is
    /// `@new`, and keys that start with `#` or `@` get an extra `#` so no
    /// two identities share a store key.
    pub fn store_key(&self) -> String {
        match self {
            RowId::Key(key) if key.starts_with(['#', '@']) => format!("#{}", key),
            RowId::Key(key) => key.clone(),
            RowId::Index(index) => format!("#{}", index),
            RowId::New => "@new".to_string(),
        }
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Key(key) => write!(f, "{}", key),
            RowId::Index(index) => write!(f, "#{}", index),
            RowId::New => write!(f, "(new)"),
        }
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self::Key(value.to_string())
    }
}

/// Render a field value as an identity key, if it can serve as one.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Derive the identity of one row.
///
/// Priority: the synthetic [`ROW_ID_FIELD`], then the declared primary key,
/// then the row's position.
pub fn derive_row_id(row: &Value, index: usize, primary_key: Option<&str>) -> RowId {
    let Some(fields) = row.as_object() else {
        return RowId::Index(index);
    };
    if let Some(key) = fields.get(ROW_ID_FIELD).and_then(key_of) {
        return RowId::Key(key);
    }
    if let Some(key) = primary_key.and_then(|pk| fields.get(pk)).and_then(key_of) {
        return RowId::Key(key);
    }
    RowId::Index(index)
}

/// A read-only snapshot of the caller's rows.
///
/// Cloning is cheap; rows and identities are shared. Identities are computed
/// once in the constructor so every render of the same snapshot sees the
/// same values.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Arc<Vec<Value>>,
    ids: Arc<Vec<RowId>>,
    /// False when the input was not an array.
    valid: bool,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// An empty dataset.
    pub fn empty() -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            ids: Arc::new(Vec::new()),
            valid: true,
        }
    }

    /// Wrap shared rows, deriving identities with the given primary key.
    pub fn new(rows: Arc<Vec<Value>>, primary_key: Option<&str>) -> Self {
        let ids = rows
            .iter()
            .enumerate()
            .map(|(i, row)| derive_row_id(row, i, primary_key))
            .collect();
        Self {
            rows,
            ids: Arc::new(ids),
            valid: true,
        }
    }

    /// Build a snapshot from arbitrary JSON input.
    ///
    /// Anything other than an array degrades to an empty, invalid dataset.
    pub fn from_value(value: Value, primary_key: Option<&str>) -> Self {
        match value {
            Value::Array(rows) => Self::new(Arc::new(rows), primary_key),
            _ => Self {
                valid: false,
                ..Self::empty()
            },
        }
    }

    /// Whether the input this snapshot was built from was an array.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// The shared row storage.
    pub fn shared_rows(&self) -> Arc<Vec<Value>> {
        Arc::clone(&self.rows)
    }

    /// Get a row by index.
    pub fn row(&self, index: usize) -> Option<&Value> {
        self.rows.get(index)
    }

    /// All row identities in order.
    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    /// Identity of the row at `index`.
    pub fn id(&self, index: usize) -> Option<&RowId> {
        self.ids.get(index)
    }

    /// Position of the row with the given identity.
    pub fn index_of(&self, id: &RowId) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// Find a row by identity.
    pub fn row_by_id(&self, id: &RowId) -> Option<&Value> {
        self.index_of(id).and_then(|i| self.rows.get(i))
    }

    /// Whether every row is an object with at least one key.
    pub fn has_object_rows(&self) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|row| row.as_object().is_some_and(|m| !m.is_empty()))
    }

    /// Whether both snapshots share the same row storage.
    pub fn same_snapshot(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// Whether both snapshots have the same length and identity set.
    ///
    /// Derived grid state only needs rebuilding when this is false.
    pub fn same_shape(&self, other: &Dataset) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mine: HashSet<&RowId> = self.ids.iter().collect();
        other.ids.iter().all(|id| mine.contains(id))
    }
}

// =============================================================================
// External datasource
// =============================================================================

/// Error reported by an external datasource.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Datasource error: {message}")]
pub struct DatasourceError {
    pub message: String,
}

impl DatasourceError {
    /// Create a new datasource error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A server-backed source of rows.
///
/// The grid only ever touches the result-size ceiling. Fetching belongs to
/// the host, which pushes the resulting rows back through `Grid::set_rows`
/// whenever they arrive.
#[async_trait]
pub trait Datasource: Send + Sync + std::fmt::Debug {
    /// Current maximum number of results per fetch, if the source pages.
    fn max_results(&self) -> Option<usize>;

    /// Set the maximum number of results per fetch.
    fn set_max_results(&self, max: usize);

    /// Whether the source pages on the server.
    fn is_server_paged(&self) -> bool {
        self.max_results().is_some()
    }

    /// Total number of rows available on the server, if known.
    fn total_count(&self) -> Option<usize> {
        None
    }

    /// Fetch one page of rows.
    async fn fetch(&self, page_index: usize, page_size: usize) -> Result<Vec<Value>, DatasourceError>;
}

/// An in-process datasource that pages over a fixed row set.
///
/// Useful for hosts without a server and for exercising server paging.
#[derive(Debug)]
pub struct MemoryDatasource {
    rows: RwLock<Vec<Value>>,
    max_results: AtomicUsize,
}

impl MemoryDatasource {
    /// Create a datasource over the given rows with a result ceiling.
    pub fn new(rows: Vec<Value>, max_results: usize) -> Self {
        Self {
            rows: RwLock::new(rows),
            max_results: AtomicUsize::new(max_results),
        }
    }

    /// Replace the backing rows.
    pub fn set_rows(&self, rows: Vec<Value>) {
        if let Ok(mut guard) = self.rows.write() {
            *guard = rows;
        }
    }
}

#[async_trait]
impl Datasource for MemoryDatasource {
    fn max_results(&self) -> Option<usize> {
        Some(self.max_results.load(Ordering::SeqCst))
    }

    fn set_max_results(&self, max: usize) {
        self.max_results.store(max, Ordering::SeqCst);
    }

    fn total_count(&self) -> Option<usize> {
        self.rows.read().ok().map(|g| g.len())
    }

    async fn fetch(&self, page_index: usize, page_size: usize) -> Result<Vec<Value>, DatasourceError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| DatasourceError::new("row storage poisoned"))?;
        let start = page_index.saturating_mul(page_size).min(guard.len());
        let end = start.saturating_add(page_size).min(guard.len());
        Ok(guard[start..end].to_vec())
    }
}
