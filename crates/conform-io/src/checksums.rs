//! The `sha256sums` provenance sub-tree of a test descriptor.
//!
//! Maps case file names to hex SHA-256 digests. It is never compared against
//! decoder output; these helpers list, update and verify it.

use crate::{IoError, IoResult};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Descriptor key holding the checksum map.
pub const SHA256_KEY: &str = "sha256sums";

/// Result of checking one listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumStatus {
    /// File name relative to the case directory.
    pub file: String,
    /// Digest recorded in the descriptor.
    pub expected: String,
    /// Digest of the file on disk, `None` if it could not be read.
    pub actual: Option<String>,
}

impl ChecksumStatus {
    /// True if the file exists and matches.
    pub fn is_ok(&self) -> bool {
        self.actual.as_deref() == Some(self.expected.as_str())
    }
}

/// Returns `(file, digest)` pairs from a descriptor, in file order.
pub fn list_shas(descriptor: &Path) -> IoResult<Vec<(String, String)>> {
    let tree = crate::read_json(descriptor)?;
    let Some(sums) = tree.get(SHA256_KEY).and_then(Value::as_object) else {
        return Ok(Vec::new());
    };
    Ok(sums
        .iter()
        .map(|(file, sha)| (file.clone(), digest_text(sha)))
        .collect())
}

/// Sets `sha256sums[file] = sha` and rewrites the descriptor.
///
/// Creates the checksum map if absent. Other keys keep their order.
pub fn update_sha(descriptor: &Path, file: &str, sha: &str) -> IoResult<()> {
    let mut tree = crate::read_json(descriptor)?;
    let root = tree
        .as_object_mut()
        .ok_or_else(|| IoError::Descriptor("root must be an object".into()))?;

    let sums = root
        .entry(SHA256_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(sums) = sums else {
        return Err(IoError::Descriptor(format!("'{SHA256_KEY}' must be an object")));
    };
    sums.insert(file.to_string(), Value::String(sha.to_string()));

    debug!(descriptor = %descriptor.display(), file, sha, "Updated checksum");
    crate::write_json(descriptor, &tree)
}

/// Hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> IoResult<String> {
    let data = crate::read_bytes(path)?;
    Ok(hex_digest(&data))
}

/// Hex SHA-256 of a byte slice.
pub fn hex_digest(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Recomputes every listed digest relative to `case_dir`.
pub fn verify_case(case_dir: &Path) -> IoResult<Vec<ChecksumStatus>> {
    let listed = list_shas(&case_dir.join("test.json"))?;
    Ok(listed
        .into_iter()
        .map(|(file, expected)| {
            let actual = sha256_file(&case_dir.join(&file)).ok();
            ChecksumStatus {
                file,
                expected,
                actual,
            }
        })
        .collect())
}

fn digest_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hex_digest_of_empty() {
        assert_eq!(hex_digest(b""), EMPTY_SHA);
    }

    #[test]
    fn test_list_without_checksums() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, r#"{"frames": []}"#).unwrap();
        assert!(list_shas(&path).unwrap().is_empty());
    }

    #[test]
    fn test_update_creates_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, r#"{"zeta": 1, "alpha": 2}"#).unwrap();

        update_sha(&path, "input.jxl", "abc").unwrap();
        update_sha(&path, "reference.icc", "def").unwrap();
        update_sha(&path, "input.jxl", "123").unwrap();

        let tree = crate::read_json(&path).unwrap();
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", SHA256_KEY]);

        let listed = list_shas(&path).unwrap();
        assert_eq!(
            listed,
            [
                ("input.jxl".to_string(), "123".to_string()),
                ("reference.icc".to_string(), "def".to_string()),
            ]
        );
        assert!(std::fs::read_to_string(&path).unwrap().contains("\n  \"zeta\""));
    }

    #[test]
    fn test_update_rejects_non_object_sums() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, r#"{"sha256sums": []}"#).unwrap();
        assert!(matches!(
            update_sha(&path, "a", "b"),
            Err(IoError::Descriptor(_))
        ));
    }

    #[test]
    fn test_verify_case() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.bin"), b"").unwrap();
        std::fs::write(dir.path().join("other.bin"), b"x").unwrap();
        std::fs::write(
            dir.path().join("test.json"),
            format!(
                r#"{{"sha256sums": {{"empty.bin": "{EMPTY_SHA}", "other.bin": "{EMPTY_SHA}", "gone.bin": "00"}}}}"#
            ),
        )
        .unwrap();

        let statuses = verify_case(dir.path()).unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(statuses[0].is_ok());
        assert!(!statuses[1].is_ok());
        assert!(statuses[2].actual.is_none());
    }
}
