//! Errors that stop a whole run.
//!
//! Anything going wrong inside a single case is recorded in that case's
//! [`CaseRecord`](crate::CaseRecord) instead.

use conform_io::IoError;
use thiserror::Error;

/// Result type for run-level operations.
pub type RunResult<T> = Result<T, RunError>;

/// Failures that prevent a run from starting or finishing.
#[derive(Debug, Error)]
pub enum RunError {
    /// Decoder command line is empty.
    #[error("decoder command is empty")]
    EmptyDecoder,

    /// Decoder command line has an unterminated quote or trailing escape.
    #[error("cannot parse decoder command '{0}'")]
    BadDecoderCommand(String),

    /// Corpus index could not be read.
    #[error("cannot read corpus index: {0}")]
    Index(#[source] IoError),

    /// Results file could not be written.
    #[error("cannot write results: {0}")]
    Results(#[source] IoError),

    /// Worker pool for parallel runs could not be built.
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
