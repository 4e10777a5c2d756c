//! Byte-exact comparison.

use crate::failure;
use conform_core::Verdict;
use std::path::Path;
use tracing::trace;

/// Compares two files for identical contents.
///
/// Used for artifacts that must reproduce bit for bit: the reconstructed
/// legacy JPEG and the original embedded ICC profile. A file that cannot be
/// read fails the comparison.
pub fn compare_binary(reference: &Path, candidate: &Path) -> Verdict {
    trace!(reference = %reference.display(), candidate = %candidate.display(), "compare_binary");

    let reference_data = match std::fs::read(reference) {
        Ok(data) => data,
        Err(e) => return failure(format!("Cannot read {}: {e}", reference.display())),
    };
    let candidate_data = match std::fs::read(candidate) {
        Ok(data) => data,
        Err(e) => return failure(format!("Cannot read {}: {e}", candidate.display())),
    };

    if reference_data != candidate_data {
        return failure(format!(
            "Binary files mismatch: {} {}",
            reference.display(),
            candidate.display()
        ));
    }
    Verdict::pass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_files_match() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        assert!(compare_binary(&a, &b).success);
    }

    #[test]
    fn test_large_random_single_byte_flip() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("ref.jpg");
        let b = dir.path().join("dec.jpg");

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut data = vec![0u8; 4 << 20];
        rng.fill(data.as_mut_slice());
        std::fs::write(&a, &data).unwrap();
        std::fs::write(&b, &data).unwrap();
        assert!(compare_binary(&a, &b).success);

        let at = rng.gen_range(0..data.len());
        data[at] ^= 0x01;
        std::fs::write(&b, &data).unwrap();
        let verdict = compare_binary(&a, &b);
        assert!(!verdict.success);
        assert!(verdict.message().contains("ref.jpg"));
        assert!(verdict.message().contains("dec.jpg"));
    }

    #[test]
    fn test_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"abc").unwrap();
        std::fs::write(&b, b"abcd").unwrap();

        assert!(!compare_binary(&a, &b).success);
    }

    #[test]
    fn test_missing_candidate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        std::fs::write(&a, b"abc").unwrap();

        let verdict = compare_binary(&a, &dir.path().join("missing"));
        assert!(!verdict.success);
        assert!(verdict.message().contains("missing"));
    }
}
