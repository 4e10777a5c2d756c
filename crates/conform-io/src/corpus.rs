//! Corpus index and case directory layout.
//!
//! A corpus is a directory with one sub-directory per case and an index file
//! (`corpus.txt`) listing case ids one per line. A run may also point at a
//! different index file inside the corpus directory to select a subset.

use crate::{IoError, IoResult};
use std::path::{Path, PathBuf};

/// Index file name used when a corpus directory is given.
pub const INDEX_FILE: &str = "corpus.txt";

/// A resolved corpus: where cases live and which index lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    dir: PathBuf,
    index: PathBuf,
}

impl Corpus {
    /// Resolves a corpus from a directory or an index file path.
    pub fn open(path: &Path) -> Self {
        if path.is_dir() {
            Self {
                dir: path.to_path_buf(),
                index: path.join(INDEX_FILE),
            }
        } else {
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Self {
                dir,
                index: path.to_path_buf(),
            }
        }
    }

    /// Directory holding the case sub-directories.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Index file listing case ids.
    pub fn index(&self) -> &Path {
        &self.index
    }

    /// Reads case ids in index order, skipping blank lines.
    pub fn case_ids(&self) -> IoResult<Vec<String>> {
        let text =
            std::fs::read_to_string(&self.index).map_err(|e| IoError::file(&self.index, e))?;
        Ok(text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// File layout of one case.
    pub fn case(&self, id: &str) -> CaseLayout {
        CaseLayout::new(self.dir.join(id))
    }
}

/// Paths of the reference files in one case directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLayout {
    dir: PathBuf,
}

impl CaseLayout {
    /// Wraps a case directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Case directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encoded input handed to the decoder.
    pub fn input(&self) -> PathBuf {
        self.dir.join("input.jxl")
    }

    /// Test descriptor.
    pub fn descriptor(&self) -> PathBuf {
        self.dir.join("test.json")
    }

    /// Reference pixels of every frame.
    pub fn reference_image(&self) -> PathBuf {
        self.dir.join("reference_image.npy")
    }

    /// Reference preview pixels.
    pub fn reference_preview(&self) -> PathBuf {
        self.dir.join("reference_preview.npy")
    }

    /// Profile the reference pixels are expressed in.
    pub fn reference_icc(&self) -> PathBuf {
        self.dir.join("reference.icc")
    }

    /// Any other file in the case directory, such as an exact-match reference.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_directory_uses_default_index() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::open(dir.path());
        assert_eq!(corpus.dir(), dir.path());
        assert_eq!(corpus.index(), dir.path().join(INDEX_FILE));
    }

    #[test]
    fn test_open_index_file_uses_parent() {
        let dir = tempfile::tempdir().unwrap();
        let subset = dir.path().join("subset.txt");
        std::fs::write(&subset, "a\n").unwrap();

        let corpus = Corpus::open(&subset);
        assert_eq!(corpus.dir(), dir.path());
        assert_eq!(corpus.index(), subset);
    }

    #[test]
    fn test_case_ids_keep_order_skip_blanks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "zebra\nalpha\r\n\n  \nmiddle").unwrap();

        let ids = Corpus::open(dir.path()).case_ids().unwrap();
        assert_eq!(ids, ["zebra", "alpha", "middle"]);
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = Corpus::open(dir.path()).case_ids().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_case_layout_paths() {
        let corpus = Corpus::open(Path::new("/corpus/corpus.txt"));
        let case = corpus.case("bicycles");
        assert_eq!(case.input(), Path::new("/corpus/bicycles/input.jxl"));
        assert_eq!(case.reference_icc(), Path::new("/corpus/bicycles/reference.icc"));
        assert_eq!(case.file("original.icc"), Path::new("/corpus/bicycles/original.icc"));
    }
}
