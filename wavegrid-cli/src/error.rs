//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;
use wavegrid::GridError;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n\n{usage}", usage = crate::args::USAGE)]
    Usage(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid state URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Grid(#[from] GridError),
}

impl CliError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Creates an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error for a path.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
