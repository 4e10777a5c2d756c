//! # conform-check
//!
//! Verifies that a decoder's output conforms to a reference corpus.
//!
//! The comparators are pure functions returning a [`Verdict`]:
//!
//! - [`compare_binary`] - byte-exact file equality
//! - [`compare_metadata`] - shallow structural/numeric tree comparison
//! - [`compare_pixels`] - per-frame RMSE and peak error, with ICC reconciliation
//!
//! [`run_case`] drives the decoder and the comparators for one test case and
//! produces a [`CaseRecord`]; [`run_corpus`] does so for every case in an index.
//!
//! ```text
//! run_corpus
//!    |
//!    +-- run_case (per case, private temp dir)
//!           |
//!           +-- Decoder (external process)
//!           +-- compare_binary / compare_metadata / compare_pixels
//!           +-- CaseRecord
//! ```

#![warn(missing_docs)]

mod binary;
mod case;
mod decoder;
mod error;
mod metadata;
mod pixels;
mod report;
mod runner;

pub use binary::compare_binary;
pub use case::{run_case, ORIGINAL_ICC, RECONSTRUCTED_JPEG};
pub use decoder::{split_command, CommandLine, DecodeOutputs, Decoder};
pub use error::{RunError, RunResult};
pub use metadata::{compare_metadata, FLOAT_TOLERANCE, RESERVED_KEYS};
pub use pixels::{compare_pixels, frame_metrics};
pub use report::{BinaryCheck, CaseRecord};
pub use runner::{run_corpus, RunConfig, RunSummary};

pub use conform_core::{PixelMetrics, Verdict};

/// Builds a failed verdict and logs it.
pub(crate) fn failure(message: impl Into<String>) -> Verdict {
    let message = message.into();
    tracing::warn!("{message}");
    Verdict::fail(message)
}
