//! # conform-io
//!
//! Reading and writing the files a conformance corpus is made of.
//!
//! - [`npy`] - `.npy` numeric arrays holding reference and decoded pixels
//! - [`descriptor`] - per-case `test.json` descriptors
//! - [`corpus`] - the case index and per-case file layout
//! - [`checksums`] - the `sha256sums` provenance sub-tree of a descriptor

#![warn(missing_docs)]

pub mod checksums;
pub mod corpus;
pub mod descriptor;
mod error;
pub mod npy;

pub use corpus::{CaseLayout, Corpus};
pub use descriptor::{TestDescriptor, Tolerance};
pub use error::{IoError, IoResult};
pub use npy::{read_npy, write_npy};

use std::path::Path;

/// Reads a whole file, attaching the path to any error.
pub fn read_bytes(path: &Path) -> IoResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| IoError::file(path, e))
}

/// Reads and parses a JSON file, keeping object key order.
pub fn read_json(path: &Path) -> IoResult<serde_json::Value> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    serde_json::from_str(&text).map_err(|e| IoError::json(path, e))
}

/// Writes `value` as JSON indented by two spaces.
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> IoResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| IoError::json(path, e))?;
    std::fs::write(path, text).map_err(|e| IoError::file(path, e))
}
