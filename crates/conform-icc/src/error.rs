//! Color reconciliation errors.

use thiserror::Error;

/// Result type for profile and transform operations.
pub type IccResult<T> = Result<T, IccError>;

/// Reasons two profiles cannot be reconciled.
#[derive(Debug, Error)]
pub enum IccError {
    /// Bytes are not a parseable ICC profile.
    #[error("invalid ICC profile: {0}")]
    Parse(String),

    /// Profile is parseable but does not describe RGB data.
    #[error("{role} profile describes {space}, expected RGB")]
    NotRgbProfile {
        /// Which side of the conversion, `source` or `destination`.
        role: &'static str,
        /// Color space signature found in the header.
        space: String,
    },

    /// Little CMS refused to build the transform.
    #[error("cannot build color transform: {0}")]
    Transform(String),

    /// Profile could not be serialized back to bytes.
    #[error("cannot serialize ICC profile: {0}")]
    Serialize(String),

    /// Samples have too few channels to hold RGB.
    #[error("cannot convert {channels}-channel samples, at least 3 required")]
    NotRgb {
        /// Channel count of the rejected samples.
        channels: usize,
    },
}
