//! Error types for tessera-cli

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for tessera-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tessera-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the indexing crates
    #[error("{0}")]
    Core(#[from] tessera_core::Error),

    /// Input file could not be read
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Input file is not valid JSON
    #[error("Invalid JSON in '{}': {source}", path.display())]
    Json {
        /// File that failed
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// Output could not be written
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Primary key argument is not a hex string
    #[error("Invalid hex key '{0}': expected pairs of hex digits")]
    InvalidHex(String),
}

impl Error {
    /// Creates a read error for `path`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error for `path`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
