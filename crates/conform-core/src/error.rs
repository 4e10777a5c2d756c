//! Error types for conform-core.
//!
//! Comparators never return these: a comparison outcome is a
//! [`Verdict`](crate::Verdict). Errors here describe buffers that could not be
//! built in the first place.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or indexing pixel buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// Sample count does not match the declared shape.
    #[error("buffer of shape {shape} needs {expected} samples, got {got}")]
    SampleCountMismatch {
        /// Declared shape, formatted as a tuple.
        shape: String,
        /// Samples implied by the shape.
        expected: usize,
        /// Samples actually supplied.
        got: usize,
    },

    /// Shape cannot describe a pixel buffer.
    #[error("invalid shape {shape}: {reason}")]
    InvalidShape {
        /// Offending shape as read from the source.
        shape: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Frame index is past the end of the buffer.
    #[error("frame {index} out of range for buffer with {frames} frame(s)")]
    FrameOutOfRange {
        /// Requested frame.
        index: usize,
        /// Frames available.
        frames: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidShape`] from any debuggable shape description.
    #[inline]
    pub fn invalid_shape(shape: impl std::fmt::Debug, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape: format!("{shape:?}"),
            reason: reason.into(),
        }
    }
}
