//! Error types shared by the reader library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, LegiloError>;

/// Errors that can reach the caller of the library.
///
/// Provider failures are not part of this enum: they are absorbed at the
/// lookup boundary and never surface as errors.
#[derive(Debug, Error)]
pub enum LegiloError {
    /// I/O error during file operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed.
    #[error("failed to load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The file opened as a text is not plain UTF-8 text.
    #[error("failed to read text from {path}, the file must be a txt-file: {reason}")]
    NotText { path: PathBuf, reason: String },

    /// A page index outside the document was requested.
    #[error("page {index} out of range, the text has {pages} page(s)")]
    PageOutOfRange { index: usize, pages: usize },
}

impl LegiloError {
    #[must_use]
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LegiloError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
