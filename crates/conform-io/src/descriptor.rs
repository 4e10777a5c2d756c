//! Per-case test descriptors (`test.json`).
//!
//! A descriptor is both the source of per-case settings (which optional
//! artifacts exist, frame tolerances) and the reference metadata tree the
//! decoder's `meta.json` is compared against. Key order from the file is kept.

use crate::checksums::SHA256_KEY;
use crate::{IoError, IoResult};
use serde_json::{Map, Value};
use std::path::Path;

/// Numeric limits for one compared frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Maximum allowed per-channel RMSE.
    pub rms_error: f64,
    /// Maximum allowed absolute sample error.
    pub peak_error: f64,
}

/// A loaded descriptor with its checksum sub-tree removed.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDescriptor {
    tree: Value,
    frames: Vec<Tolerance>,
    preview: Option<Tolerance>,
    reconstructed_jpeg: bool,
    original_icc: bool,
}

impl TestDescriptor {
    /// Loads `test.json` from disk.
    pub fn load(path: &Path) -> IoResult<Self> {
        Self::from_value(crate::read_json(path)?)
    }

    /// Builds a descriptor from an already parsed tree.
    ///
    /// # Errors
    ///
    /// Fails when the root is not an object, `frames` is missing, or a
    /// tolerance is not numeric.
    pub fn from_value(mut tree: Value) -> IoResult<Self> {
        let root = tree
            .as_object_mut()
            .ok_or_else(|| IoError::Descriptor("root must be an object".into()))?;
        root.shift_remove(SHA256_KEY);

        let frames = root
            .get("frames")
            .and_then(Value::as_array)
            .ok_or_else(|| IoError::Descriptor("'frames' must be a list".into()))?
            .iter()
            .enumerate()
            .map(|(i, frame)| tolerance(frame, &format!("frames[{i}]")))
            .collect::<IoResult<Vec<_>>>()?;

        let preview = root
            .get("preview")
            .map(|p| tolerance(p, "preview"))
            .transpose()?;

        Ok(Self {
            frames,
            preview,
            reconstructed_jpeg: root.contains_key("reconstructed_jpeg"),
            original_icc: root.contains_key("original_icc"),
            tree,
        })
    }

    /// The reference metadata tree (checksums stripped).
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Tolerances of every declared frame, in declaration order.
    pub fn frames(&self) -> &[Tolerance] {
        &self.frames
    }

    /// Preview tolerance, if a preview is declared.
    pub fn preview(&self) -> Option<Tolerance> {
        self.preview
    }

    /// Whether a reconstructed legacy JPEG is expected.
    pub fn has_reconstructed_jpeg(&self) -> bool {
        self.reconstructed_jpeg
    }

    /// Whether the original embedded ICC profile is expected.
    pub fn has_original_icc(&self) -> bool {
        self.original_icc
    }
}

fn tolerance(node: &Value, at: &str) -> IoResult<Tolerance> {
    let obj: &Map<String, Value> = node
        .as_object()
        .ok_or_else(|| IoError::Descriptor(format!("{at} must be an object")))?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| IoError::Descriptor(format!("{at}.{key} must be a number")))
    };
    Ok(Tolerance {
        rms_error: field("rms_error")?,
        peak_error: field("peak_error")?,
    })
}
