//! Pixel comparison.
//!
//! One frame of the decoded buffer is compared against the same frame of the
//! reference. When the ICC profiles differ, the decoded frame's color channels
//! are first converted into the reference color space. The frame passes if
//! the worst per-channel RMSE and the global peak error are both within limits.
//! Metrics are attached to the verdict whatever the outcome.

use crate::failure;
use conform_core::{PixelBuffer, PixelMetrics, Verdict};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Compares frame `frame_index` of `decoded` against `reference`.
///
/// If `reference_icc` and `decoded_icc` differ, the first three channels of
/// the decoded frame are replaced in place by their conversion into the
/// reference profile. `reference` is never modified.
pub fn compare_pixels(
    reference: &PixelBuffer,
    reference_icc: &[u8],
    decoded: &mut PixelBuffer,
    decoded_icc: &[u8],
    frame_index: usize,
    rms_limit: f64,
    peak_limit: f64,
) -> Verdict {
    trace!(frame_index, rms_limit, peak_limit, "compare_pixels");

    if reference.shape() != decoded.shape() {
        return failure(format!(
            "Expected shape {} but found {}",
            reference.shape(),
            decoded.shape()
        ));
    }
    let channels = reference.shape().channels;

    let reference_frame = match reference.frame(frame_index) {
        Ok(frame) => frame,
        Err(e) => return failure(e.to_string()),
    };
    let decoded_frame = match decoded.frame_mut(frame_index) {
        Ok(frame) => frame,
        Err(e) => return failure(e.to_string()),
    };

    if reference_icc != decoded_icc {
        if channels < 3 {
            return failure("Only RGB images are supported");
        }
        debug!(frame_index, "Converting decoded colors into the reference profile");
        if let Err(e) =
            conform_icc::convert_interleaved(decoded_icc, reference_icc, decoded_frame, channels)
        {
            return failure(format!("Color conversion failed: {e}"));
        }
    }

    let metrics = frame_metrics(reference_frame, decoded_frame, channels, rms_limit, peak_limit);
    debug!(
        rmses = ?metrics.actual_rmses,
        peak_error = metrics.actual_peak_error,
        "Frame {frame_index} error"
    );

    if !metrics.rmse_ok() {
        let message = format!("RMSE too large: {} > {}", metrics.actual_rmse, rms_limit);
        return failure(message).with_metrics(metrics);
    }
    if !metrics.peak_ok() {
        let message = format!(
            "Peak error too large: {} > {}",
            metrics.actual_peak_error, peak_limit
        );
        return failure(message).with_metrics(metrics);
    }
    Verdict::pass().with_metrics(metrics)
}

/// Error statistics of two interleaved frames with `channels` samples per pixel.
///
/// Per-channel RMSE is `sqrt(mean(|ref - dec|^2))`; the frame RMSE is the
/// largest of those. Peak error is the largest absolute difference overall.
/// An empty frame reports zero error. NaN samples propagate into the metrics.
pub fn frame_metrics(
    reference: &[f64],
    decoded: &[f64],
    channels: usize,
    rms_limit: f64,
    peak_limit: f64,
) -> PixelMetrics {
    let pixels = if channels == 0 { 0 } else { reference.len() / channels };
    let stats = if pixels == 0 {
        ErrorStats::new(channels)
    } else {
        reference
            .par_chunks(channels)
            .zip(decoded.par_chunks(channels))
            .fold(
                || ErrorStats::new(channels),
                |mut acc, (r, d)| {
                    acc.add_pixel(r, d);
                    acc
                },
            )
            .reduce(|| ErrorStats::new(channels), ErrorStats::merge)
    };

    let actual_rmses: Vec<f64> = stats
        .sum_sq
        .iter()
        .map(|&sum| if pixels == 0 { 0.0 } else { (sum / pixels as f64).sqrt() })
        .collect();
    let actual_rmse = actual_rmses.iter().copied().fold(0.0, nan_max);

    PixelMetrics {
        actual_peak_error: stats.peak,
        actual_rmses,
        actual_rmse,
        rmse_limit: rms_limit,
        peak_error: peak_limit,
    }
}

#[derive(Debug, Clone)]
struct ErrorStats {
    sum_sq: Vec<f64>,
    peak: f64,
}

impl ErrorStats {
    fn new(channels: usize) -> Self {
        Self {
            sum_sq: vec![0.0; channels],
            peak: 0.0,
        }
    }

    fn add_pixel(&mut self, reference: &[f64], decoded: &[f64]) {
        for (ch, (&r, &d)) in reference.iter().zip(decoded).enumerate() {
            let err = (r - d).abs();
            self.sum_sq[ch] += err * err;
            self.peak = nan_max(self.peak, err);
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.sum_sq.iter_mut().zip(&other.sum_sq) {
            *a += b;
        }
        self.peak = nan_max(self.peak, other.peak);
        self
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use conform_core::Shape;
    use conform_icc::Profile;

    fn gradient(shape: Shape) -> PixelBuffer {
        PixelBuffer::from_fn(shape, |f, r, c, ch| {
            ((f + 1) * (r * 7 + c * 3 + ch)) as f64 / 97.0 % 1.0
        })
    }

    #[test]
    fn test_identical_buffers_zero_error() {
        let shape = Shape::new(2, 8, 8, 3);
        let reference = gradient(shape);
        let mut decoded = reference.clone();
        let icc = Profile::srgb().to_icc().unwrap();

        for frame in 0..2 {
            let verdict = compare_pixels(&reference, &icc, &mut decoded, &icc, frame, 0.0, 0.0);
            assert!(verdict.success, "{}", verdict.message());
            let metrics = verdict.metrics.unwrap();
            assert_eq!(metrics.actual_peak_error, 0.0);
            assert_eq!(metrics.actual_rmse, 0.0);
        }
    }

    #[test]
    fn test_constant_offset_in_one_channel() {
        let shape = Shape::new(1, 4, 5, 3);
        let reference = gradient(shape);
        let delta = 0.25;
        let mut decoded = PixelBuffer::from_fn(shape, |f, r, c, ch| {
            let base = reference.data()[((f * 4 + r) * 5 + c) * 3 + ch];
            if ch == 1 { base + delta } else { base }
        });

        let verdict = compare_pixels(&reference, b"icc", &mut decoded, b"icc", 0, 1.0, 1.0);
        let metrics = verdict.metrics.unwrap();
        assert_abs_diff_eq!(metrics.actual_rmses[1], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(metrics.actual_rmses[0], 0.0);
        assert_abs_diff_eq!(metrics.actual_rmse, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(metrics.actual_peak_error, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_worst_channel_dominates() {
        let reference = [0.0f64, 0.0, 0.0, 0.0, 0.0, 0.0];
        let decoded = [0.1f64, 0.0, 0.4, 0.1, 0.0, 0.4];
        let m = frame_metrics(&reference, &decoded, 3, 1.0, 1.0);
        assert_abs_diff_eq!(m.actual_rmse, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(m.actual_rmses[0], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let reference = gradient(Shape::new(1, 4, 4, 3));
        let mut decoded = gradient(Shape::new(1, 4, 4, 4));

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 1e9, 1e9);
        assert!(!verdict.success);
        assert_eq!(verdict.message(), "Expected shape (1, 4, 4, 3) but found (1, 4, 4, 4)");
        assert!(verdict.metrics.is_none());
    }

    #[test]
    fn test_missing_frame_axis_fails_shape_check() {
        let reference = PixelBuffer::new(Shape::new(1, 1, 1, 3), vec![0.5; 3]).unwrap();
        let mut decoded = PixelBuffer::new(Shape::single_frame(1, 1, 3), vec![0.5; 3]).unwrap();

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 0.0, 0.0);
        assert!(!verdict.success);
        assert_eq!(verdict.message(), "Expected shape (1, 1, 1, 3) but found (1, 1, 3)");
    }

    #[test]
    fn test_sub_single_precision_error_detected() {
        let reference = PixelBuffer::new(Shape::new(1, 1, 1, 3), vec![0.5; 3]).unwrap();
        let mut decoded = PixelBuffer::new(Shape::new(1, 1, 1, 3), vec![0.5, 0.5 + 1e-9, 0.5]).unwrap();

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 1.0, 0.0);
        assert!(!verdict.success);
        assert!(verdict.message().starts_with("Peak error too large"));
        let m = verdict.metrics.unwrap();
        assert_abs_diff_eq!(m.actual_peak_error, 1e-9, epsilon = 1e-15);
        assert!(!m.peak_ok());
    }

    #[test]
    fn test_rmse_failure_reports_both_metrics() {
        let reference = PixelBuffer::zeros(Shape::new(1, 2, 2, 3));
        let mut decoded = PixelBuffer::from_fn(reference.shape(), |_, _, _, _| 0.5);

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 0.1, 0.2);
        assert!(!verdict.success);
        assert!(verdict.message().starts_with("RMSE too large"));
        let m = verdict.metrics.unwrap();
        assert_eq!(m.rmse_limit, 0.1);
        assert_eq!(m.peak_error, 0.2);
        assert_abs_diff_eq!(m.actual_peak_error, 0.5);
    }

    #[test]
    fn test_peak_failure_when_rmse_passes() {
        let reference = PixelBuffer::zeros(Shape::new(1, 10, 10, 3));
        let mut decoded = reference.clone();
        decoded.data_mut()[0] = 0.9;

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 0.2, 0.5);
        assert!(!verdict.success);
        assert!(verdict.message().starts_with("Peak error too large"));
        assert!(verdict.metrics.unwrap().rmse_ok());
    }

    #[test]
    fn test_nan_samples_fail() {
        let reference = PixelBuffer::zeros(Shape::new(1, 1, 2, 3));
        let mut decoded = reference.clone();
        decoded.data_mut()[4] = f64::NAN;

        let verdict = compare_pixels(&reference, b"a", &mut decoded, b"a", 0, 1.0, 1.0);
        assert!(!verdict.success);
    }

    #[test]
    fn test_gray_with_differing_profiles_fails() {
        let reference = PixelBuffer::zeros(Shape::new(1, 2, 2, 1));
        let mut decoded = reference.clone();

        let verdict = compare_pixels(&reference, b"ref", &mut decoded, b"dec", 0, 1.0, 1.0);
        assert!(!verdict.success);
        assert_eq!(verdict.message(), "Only RGB images are supported");
    }

    #[test]
    fn test_reconciles_into_reference_profile() {
        let srgb = Profile::srgb().to_icc().unwrap();
        let linear = Profile::linear_srgb().to_icc().unwrap();
        let shape = Shape::new(1, 2, 2, 4);

        // Linear-light reference; decoder answered in sRGB with the same colors.
        let reference = PixelBuffer::from_fn(shape, |_, _, _, ch| if ch == 3 { 1.0 } else { 0.2140 });
        let mut decoded = PixelBuffer::from_fn(shape, |_, _, _, ch| if ch == 3 { 1.0 } else { 0.5 });
        let untouched = reference.clone();

        let verdict = compare_pixels(&reference, &linear, &mut decoded, &srgb, 0, 0.01, 0.01);
        assert!(verdict.success, "{}", verdict.message());
        assert_eq!(reference, untouched);
        assert!(decoded.data()[0] < 0.3);
        assert_eq!(decoded.data()[3], 1.0);
    }

    #[test]
    fn test_identical_profiles_skip_conversion() {
        let shape = Shape::new(1, 1, 1, 3);
        let reference = PixelBuffer::from_fn(shape, |_, _, _, _| 0.5);
        let mut decoded = reference.clone();

        // Not a valid profile: any conversion attempt would fail.
        let verdict = compare_pixels(&reference, b"same", &mut decoded, b"same", 0, 0.0, 0.0);
        assert!(verdict.success);
        assert_eq!(decoded, reference);
    }

    #[test]
    fn test_frame_out_of_range() {
        let reference = PixelBuffer::zeros(Shape::new(1, 1, 1, 3));
        let mut decoded = reference.clone();
        assert!(!compare_pixels(&reference, b"a", &mut decoded, b"a", 1, 1.0, 1.0).success);
    }

    #[test]
    fn test_empty_frame_reports_zero() {
        let m = frame_metrics(&[], &[], 3, 0.0, 0.0);
        assert_eq!(m.actual_rmses, vec![0.0; 3]);
        assert_eq!(m.actual_peak_error, 0.0);
    }
}
