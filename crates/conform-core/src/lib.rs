//! # conform-core
//!
//! Core types shared by the conformance crates.
//!
//! - [`PixelBuffer`] - 4-D sample array indexed as (frame, row, column, channel)
//! - [`Shape`] - dimensions of a [`PixelBuffer`]
//! - [`Verdict`] - outcome of a single artifact comparison
//! - [`PixelMetrics`] - measured pixel errors and the limits they were checked against
//! - [`Error`] - failures while building buffers
//!
//! ## Crate Structure
//!
//! ```text
//! conform-core (this crate)
//!    ^
//!    |
//!    +-- conform-io (npy, descriptors, corpus index)
//!    +-- conform-check (comparators, orchestration)
//!    +-- conform-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod verdict;

pub use buffer::{PixelBuffer, Shape};
pub use error::{Error, Result};
pub use verdict::{PixelMetrics, Verdict};
