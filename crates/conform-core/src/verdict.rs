//! Comparison outcomes.
//!
//! Every comparator returns a [`Verdict`] instead of an error. Pixel
//! comparisons additionally attach [`PixelMetrics`], and they do so on the
//! failure path too, so a report always shows how far off a frame was.

use serde::{Deserialize, Serialize};

/// Outcome of checking one artifact against its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the artifact conforms.
    pub success: bool,

    /// Human-readable reason for a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Measured errors for pixel comparisons.
    #[serde(default, flatten, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PixelMetrics>,
}

/// Error statistics for one compared frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelMetrics {
    /// Largest absolute sample difference across all channels.
    pub actual_peak_error: f64,
    /// Root-mean-square error of each channel.
    pub actual_rmses: Vec<f64>,
    /// Worst per-channel RMSE.
    pub actual_rmse: f64,
    /// RMSE limit the frame was checked against.
    pub rmse_limit: f64,
    /// Peak-error limit the frame was checked against.
    pub peak_error: f64,
}

impl Verdict {
    /// A passing verdict with no diagnostics.
    pub fn pass() -> Self {
        Self {
            success: true,
            message: None,
            metrics: None,
        }
    }

    /// A failing verdict carrying `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            metrics: None,
        }
    }

    /// Attaches pixel metrics, keeping the success flag and message.
    pub fn with_metrics(mut self, metrics: PixelMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Failure message, or an empty string for passing verdicts.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

impl PixelMetrics {
    /// True if the measured RMSE is within its limit. NaN is never within.
    pub fn rmse_ok(&self) -> bool {
        self.actual_rmse <= self.rmse_limit
    }

    /// True if the measured peak error is within its limit.
    pub fn peak_ok(&self) -> bool {
        self.actual_peak_error <= self.peak_error
    }
}
