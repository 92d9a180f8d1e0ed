//! Error types for tessera-core.

/// Errors that can occur while building index configuration, flattening
/// documents, or decoding primary keys.
///
/// Field-level errors ([`Error::Value`], [`Error::AnalyzerUnavailable`]) are
/// recoverable: the field iterator logs them and skips the offending field.
/// The remaining variants are surfaced to the caller of the failing operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or unresolvable index configuration
    #[error("Configuration error{}: {message}", location(.field))]
    Config {
        /// Configuration path of the offending option, if known
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// Malformed scalar inside a document sub-tree
    #[error("Value error at '{path}': {message}")]
    Value {
        /// Document path of the offending value
        path: String,
        /// What went wrong
        message: String,
    },

    /// Analyzer factory failed or returned no instance
    #[error("Analyzer '{name}' unavailable: {reason}")]
    AnalyzerUnavailable {
        /// Analyzer name
        name: String,
        /// Why no instance could be produced
        reason: String,
    },

    /// Primary key bytes of the wrong width
    #[error("Corrupt primary key: expected {expected} bytes, got {actual}")]
    CorruptKey {
        /// Encoded key width
        expected: usize,
        /// Width of the supplied bytes
        actual: usize,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn location(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" at '{f}'"))
        .unwrap_or_default()
}

/// Convenience `Result` type alias for Tessera operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether traversal can continue past this error.
    ///
    /// Recoverable errors affect a single field only; the rest of the
    /// document is still indexed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Value { .. } => true,
            Error::AnalyzerUnavailable { .. } => true,
            Error::Config { .. } => false,
            Error::CorruptKey { .. } => false,
            Error::Serialization(_) => false,
        }
    }

    /// Creates a configuration error without a field path.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a configuration error for a specific option path.
    pub fn config_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Config {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a value error for a document path.
    pub fn value<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Error::Value {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an analyzer-unavailable error.
    pub fn analyzer_unavailable<N, R>(name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Error::AnalyzerUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a corrupt-key error.
    pub fn corrupt_key(expected: usize, actual: usize) -> Self {
        Error::CorruptKey { expected, actual }
    }

    /// Prefixes the field path of a configuration error with `parent`.
    ///
    /// Used while descending into nested `fields` so the reported path names
    /// the full option location. Other variants pass through unchanged.
    pub fn within(self, parent: &str) -> Self {
        match self {
            Error::Config { field, message } => Error::Config {
                field: Some(match field {
                    Some(field) => format!("{parent}.{field}"),
                    None => parent.to_string(),
                }),
                message,
            },
            other => other,
        }
    }
}
