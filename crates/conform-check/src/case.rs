//! Single test case orchestration.
//!
//! ```text
//! decode (primary) -> [decode (jpeg)] -> exact checks -> metadata
//!     -> per-frame pixels -> [preview pixels] -> aggregate
//! ```
//!
//! A decoder failure stops the case. A missing output file fails only the
//! check that needs it.

use crate::decoder::{DecodeOutputs, Decoder};
use crate::report::{BinaryCheck, CaseRecord};
use crate::{compare_binary, compare_metadata, compare_pixels, failure};
use conform_core::{PixelBuffer, Verdict};
use conform_io::{read_bytes, read_json, read_npy, CaseLayout, Corpus, IoError, TestDescriptor};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Reference name of the reconstructed legacy JPEG.
pub const RECONSTRUCTED_JPEG: &str = "reconstructed.jpg";

/// Reference name of the original embedded ICC profile.
pub const ORIGINAL_ICC: &str = "original.icc";

/// Runs one test case end to end.
///
/// Decoder outputs go to a private temporary directory that is removed when
/// this function returns.
pub fn run_case(decoder: &Decoder, corpus: &Corpus, test_id: &str) -> CaseRecord {
    info!("Testing {test_id}");
    let layout = corpus.case(test_id);
    let record = CaseRecord::new(test_id);

    let descriptor = match TestDescriptor::load(&layout.descriptor()) {
        Ok(descriptor) => descriptor,
        Err(e) => return record.abort(failure(e.to_string())),
    };

    let work_dir = match tempfile::Builder::new()
        .prefix(&temp_prefix(test_id))
        .tempdir()
    {
        Ok(dir) => dir,
        Err(e) => return record.abort(failure(format!("Cannot create working directory: {e}"))),
    };
    trace!(work_dir = %work_dir.path().display(), "Case working directory");

    let outputs = DecodeOutputs::new(work_dir.path());
    let record = check_case(decoder, &layout, &descriptor, &outputs, record);
    info!(test_id, success = record.success, "Case finished");
    record
}

fn check_case(
    decoder: &Decoder,
    layout: &CaseLayout,
    descriptor: &TestDescriptor,
    outputs: &DecodeOutputs,
    mut record: CaseRecord,
) -> CaseRecord {
    let input = layout.input();

    let cmd = decoder.primary_command(&input, outputs, descriptor);
    record.cmd = cmd.display_args();
    if !cmd.run() {
        return record.abort(failure(format!("Running the decoder ({cmd}) returned error")));
    }

    if descriptor.has_reconstructed_jpeg() {
        let cmd_jpeg = decoder.jpeg_command(&input, outputs);
        record.cmd_jpeg = cmd_jpeg.display_args();
        if !cmd_jpeg.run() {
            return record.abort(failure(format!(
                "Running the decoder ({cmd_jpeg}) returned error"
            )));
        }
    }

    let mut exact: Vec<(&str, PathBuf)> = Vec::new();
    if descriptor.has_reconstructed_jpeg() {
        exact.push((RECONSTRUCTED_JPEG, outputs.reconstructed_jpeg()));
    }
    if descriptor.has_original_icc() {
        exact.push((ORIGINAL_ICC, outputs.original_icc()));
    }

    // Without a matching original profile there is no trustworthy source
    // color space to convert from, so pixels are compared unconverted.
    let mut try_color_transform = true;
    for (name, decoded) in exact {
        let verdict = compare_binary(&layout.file(name), &decoded);
        if name == ORIGINAL_ICC {
            try_color_transform = verdict.success;
        }
        record.exact_tests.push(BinaryCheck {
            name: name.to_string(),
            verdict,
        });
    }

    record.check_meta = Some(check_metadata(&outputs.metadata(), descriptor));

    let profiles = load_profiles(layout, outputs, try_color_transform);
    if !try_color_transform {
        debug!("Original ICC mismatch, color reconciliation disabled");
    }

    record.num_frames = Some(descriptor.frames().len());
    match load_buffers(&layout.reference_image(), &outputs.image(), DecodeOutputs::IMAGE) {
        Ok((reference, mut decoded)) => {
            for (i, tolerance) in descriptor.frames().iter().enumerate() {
                let verdict = with_profiles(&profiles, |reference_icc, decoded_icc| {
                    compare_pixels(
                        &reference,
                        reference_icc,
                        &mut decoded,
                        decoded_icc,
                        i,
                        tolerance.rms_error,
                        tolerance.peak_error,
                    )
                });
                record.frames.push(verdict);
            }
        }
        Err(message) => {
            let verdict = failure(message);
            record.frames = vec![verdict; descriptor.frames().len()];
        }
    }

    if let Some(tolerance) = descriptor.preview() {
        let verdict = match load_buffers(
            &layout.reference_preview(),
            &outputs.preview(),
            DecodeOutputs::PREVIEW,
        ) {
            Ok((reference, mut decoded)) => with_profiles(&profiles, |reference_icc, decoded_icc| {
                compare_pixels(
                    &reference,
                    reference_icc,
                    &mut decoded,
                    decoded_icc,
                    0,
                    tolerance.rms_error,
                    tolerance.peak_error,
                )
            }),
            Err(message) => failure(message),
        };
        record.preview = Some(verdict);
    }

    record.finish()
}

fn check_metadata(path: &Path, descriptor: &TestDescriptor) -> Verdict {
    match read_json(path) {
        Ok(meta) => compare_metadata(&meta, descriptor.tree()),
        Err(e) if e.is_not_found() => failure(not_decoded(DecodeOutputs::METADATA)),
        Err(e) => failure(e.to_string()),
    }
}

/// Reference and decoded ICC bytes, or the reason they are unavailable.
type Profiles = Result<(Vec<u8>, Vec<u8>), String>;

fn load_profiles(layout: &CaseLayout, outputs: &DecodeOutputs, try_color_transform: bool) -> Profiles {
    let reference = read_bytes(&layout.reference_icc()).map_err(|e| e.to_string())?;
    if !try_color_transform {
        return Ok((reference.clone(), reference));
    }
    let decoded = read_bytes(&outputs.icc()).map_err(|e| missing_or(e, DecodeOutputs::ICC))?;
    Ok((reference, decoded))
}

fn with_profiles(profiles: &Profiles, compare: impl FnOnce(&[u8], &[u8]) -> Verdict) -> Verdict {
    match profiles {
        Ok((reference, decoded)) => compare(reference, decoded),
        Err(message) => failure(message.clone()),
    }
}

fn load_buffers(
    reference: &Path,
    decoded: &Path,
    decoded_name: &str,
) -> Result<(PixelBuffer, PixelBuffer), String> {
    let reference = read_npy(reference).map_err(|e| e.to_string())?;
    let decoded = read_npy(decoded).map_err(|e| missing_or(e, decoded_name))?;
    Ok((reference, decoded))
}

fn missing_or(error: IoError, name: &str) -> String {
    if error.is_not_found() {
        not_decoded(name)
    } else {
        error.to_string()
    }
}

fn not_decoded(name: &str) -> String {
    format!("File not decoded: {name}")
}

/// Temp directory prefix derived from a case id, which may contain separators.
fn temp_prefix(test_id: &str) -> String {
    test_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
