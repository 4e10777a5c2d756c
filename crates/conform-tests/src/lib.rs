//! End-to-end test support for the conformance verifier.
//!
//! [`CaseFixture`] lays out one case directory the way a real corpus does and
//! additionally stages the files the `mock_decoder` binary will "decode". The
//! mock finds them next to `input.jxl`, so every case controls its own decoder
//! behavior and cases can run in parallel.
//!
//! ```text
//! <corpus>/corpus.txt
//! <corpus>/<id>/input.jxl, test.json, reference_image.npy, reference.icc, ...
//! <corpus>/<id>/mock_image.npy, mock_meta.json, mock.icc, ...   (staged)
//! ```

use anyhow::{Context, Result};
use conform_core::PixelBuffer;
use conform_icc::Profile;
use conform_io::{write_json, write_npy, CaseLayout};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File names the mock decoder reads from the case directory.
pub mod staged {
    /// Copied to the primary output path.
    pub const IMAGE: &str = "mock_image.npy";
    /// Copied to `--preview_out`.
    pub const PREVIEW: &str = "mock_preview.npy";
    /// Copied to `--metadata_out`.
    pub const METADATA: &str = "mock_meta.json";
    /// Copied to `--icc_out`.
    pub const ICC: &str = "mock.icc";
    /// Copied to `--orig_icc_out`.
    pub const ORIGINAL_ICC: &str = "mock_original.icc";
    /// Copied to a `.jpg` output path.
    pub const RECONSTRUCTED_JPEG: &str = "mock_reconstructed.jpg";
    /// If present, the mock exits with this status without writing anything.
    pub const EXIT_CODE: &str = "mock_exit_code";
    /// One line per invocation, arguments separated by tabs.
    pub const CALLS: &str = "mock_calls.txt";
}

/// Writes the corpus index listing `ids` in order.
pub fn write_index(corpus_dir: &Path, ids: &[&str]) -> Result<PathBuf> {
    let path = corpus_dir.join("corpus.txt");
    let mut text = ids.join("\n");
    text.push('\n');
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Serialized sRGB profile.
pub fn srgb_icc() -> Result<Vec<u8>> {
    Ok(Profile::srgb().to_icc()?)
}

/// Serialized linear-sRGB profile.
pub fn linear_srgb_icc() -> Result<Vec<u8>> {
    Ok(Profile::linear_srgb().to_icc()?)
}

/// One case directory under construction.
#[derive(Debug, Clone)]
pub struct CaseFixture {
    layout: CaseLayout,
}

impl CaseFixture {
    /// Creates `<corpus_dir>/<id>` with a placeholder `input.jxl`.
    pub fn create(corpus_dir: &Path, id: &str) -> Result<Self> {
        let layout = CaseLayout::new(corpus_dir.join(id));
        fs::create_dir_all(layout.dir())
            .with_context(|| format!("Failed to create {}", layout.dir().display()))?;
        let fixture = Self { layout };
        fixture.write(&fixture.layout.input(), b"\xff\x0a")?;
        Ok(fixture)
    }

    /// Paths of the case files.
    pub fn layout(&self) -> &CaseLayout {
        &self.layout
    }

    /// Writes `test.json`.
    pub fn descriptor(&self, tree: &Value) -> Result<&Self> {
        write_json(&self.layout.descriptor(), tree)?;
        Ok(self)
    }

    /// Writes `reference_image.npy`.
    pub fn reference_image(&self, buffer: &PixelBuffer) -> Result<&Self> {
        write_npy(&self.layout.reference_image(), buffer)?;
        Ok(self)
    }

    /// Writes `reference_preview.npy`.
    pub fn reference_preview(&self, buffer: &PixelBuffer) -> Result<&Self> {
        write_npy(&self.layout.reference_preview(), buffer)?;
        Ok(self)
    }

    /// Writes `reference.icc`.
    pub fn reference_icc(&self, icc: &[u8]) -> Result<&Self> {
        self.write(&self.layout.reference_icc(), icc)?;
        Ok(self)
    }

    /// Writes an exact-match reference such as `original.icc`.
    pub fn reference_file(&self, name: &str, data: &[u8]) -> Result<&Self> {
        self.write(&self.layout.file(name), data)?;
        Ok(self)
    }

    /// Pixels the mock decoder will output.
    pub fn decodes_image(&self, buffer: &PixelBuffer) -> Result<&Self> {
        write_npy(&self.layout.file(staged::IMAGE), buffer)?;
        Ok(self)
    }

    /// Preview pixels the mock decoder will output.
    pub fn decodes_preview(&self, buffer: &PixelBuffer) -> Result<&Self> {
        write_npy(&self.layout.file(staged::PREVIEW), buffer)?;
        Ok(self)
    }

    /// Metadata tree the mock decoder will output.
    pub fn decodes_metadata(&self, tree: &Value) -> Result<&Self> {
        write_json(&self.layout.file(staged::METADATA), tree)?;
        Ok(self)
    }

    /// Profile the mock decoder reports its pixels in.
    pub fn decodes_icc(&self, icc: &[u8]) -> Result<&Self> {
        self.write(&self.layout.file(staged::ICC), icc)?;
        Ok(self)
    }

    /// Original profile the mock decoder extracts.
    pub fn decodes_original_icc(&self, icc: &[u8]) -> Result<&Self> {
        self.write(&self.layout.file(staged::ORIGINAL_ICC), icc)?;
        Ok(self)
    }

    /// JPEG bitstream the mock decoder reconstructs.
    pub fn decodes_jpeg(&self, data: &[u8]) -> Result<&Self> {
        self.write(&self.layout.file(staged::RECONSTRUCTED_JPEG), data)?;
        Ok(self)
    }

    /// Makes every mock invocation exit with `code`.
    pub fn exits_with(&self, code: i32) -> Result<&Self> {
        self.write(&self.layout.file(staged::EXIT_CODE), code.to_string().as_bytes())?;
        Ok(self)
    }

    /// Argument lists of every mock invocation so far.
    pub fn calls(&self) -> Result<Vec<Vec<String>>> {
        let path = self.layout.file(staged::CALLS);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(text
            .lines()
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect())
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
    }
}
