//! Error types for grid operations.

use crate::dataset::RowId;
use crate::persist::CodecError;
use crate::store::StoreError;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors surfaced by the grid orchestrator.
///
/// Most engine guards are silent no-ops rather than errors; these variants
/// cover calls the host made with arguments that can never succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A column override named an unknown column, key, or value type.
    #[error("Invalid override for column {index} key '{key}': {reason}")]
    InvalidOverride {
        index: usize,
        key: String,
        reason: String,
    },

    /// The row identity is not part of the current dataset snapshot.
    #[error("Row '{0}' not found in dataset")]
    RowNotFound(RowId),

    /// A path-addressed store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Persisted widget state could not be decoded.
    #[error("Invalid persisted state: {0}")]
    State(#[from] CodecError),
}

impl GridError {
    /// Creates a new invalid override error.
    pub fn invalid_override(index: usize, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOverride {
            index,
            key: key.into(),
            reason: reason.into(),
        }
    }
}
