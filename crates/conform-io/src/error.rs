//! Error types for corpus I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for corpus I/O.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Errors raised while reading or writing corpus files.
#[derive(Debug, Error)]
pub enum IoError {
    /// File could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// File that failed.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Payload does not start with the `.npy` magic or has an unknown version.
    #[error("not a .npy file: {0}")]
    NpyMagic(String),

    /// `.npy` header dictionary is malformed.
    #[error("malformed .npy header: {0}")]
    NpyHeader(String),

    /// Sample type the reader does not handle.
    #[error("unsupported .npy dtype '{0}'")]
    UnsupportedDtype(String),

    /// JSON could not be parsed or serialized.
    #[error("{}: {source}", path.display())]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Test descriptor lacks a required field or has the wrong type for one.
    #[error("malformed test descriptor: {0}")]
    Descriptor(String),

    /// Buffer construction failed.
    #[error(transparent)]
    Core(#[from] conform_core::Error),
}

impl IoError {
    /// Wraps an OS error with the path it concerns.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Wraps a JSON error with the path it concerns.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// True if the error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::File { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
