//! Per-case diagnostic records.

use conform_core::Verdict;
use serde::{Deserialize, Serialize};

/// Outcome of one exact-match artifact check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryCheck {
    /// Reference file name in the case directory.
    pub name: String,
    /// Comparison result.
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Everything checked for one test case.
///
/// `success` is the conjunction of every sub-verdict present. A case that
/// stops early (decoder failure, unreadable descriptor) carries `message`
/// and is unsuccessful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Case id from the corpus index.
    pub test_id: String,
    /// Primary decoder invocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
    /// JPEG reconstruction invocation, when one was run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd_jpeg: Vec<String>,
    /// Aggregate result.
    pub success: bool,
    /// Reason a case stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Exact-match checks, in the order they ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exact_tests: Vec<BinaryCheck>,
    /// Metadata tree check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_meta: Option<Verdict>,
    /// Number of frames the descriptor declares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<usize>,
    /// One pixel check per declared frame.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Verdict>,
    /// Preview pixel check, when a preview is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Verdict>,
}

impl CaseRecord {
    /// An empty, not yet successful record.
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            cmd: Vec::new(),
            cmd_jpeg: Vec::new(),
            success: false,
            message: None,
            exact_tests: Vec::new(),
            check_meta: None,
            num_frames: None,
            frames: Vec::new(),
            preview: None,
        }
    }

    /// Stops the case with a failure; no further checks are recorded.
    pub(crate) fn abort(mut self, verdict: Verdict) -> Self {
        self.success = false;
        self.message = verdict.message;
        self
    }

    /// Computes the aggregate from the recorded sub-verdicts.
    pub(crate) fn finish(mut self) -> Self {
        self.success = self.check_meta.as_ref().is_some_and(|v| v.success)
            && self.exact_tests.iter().all(|c| c.verdict.success)
            && self.frames.iter().all(|v| v.success)
            && self.preview.as_ref().is_none_or(|v| v.success);
        self
    }

    /// Labelled failure messages, for summaries.
    pub fn failures(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(message) = &self.message {
            out.push(("case".to_string(), message.clone()));
        }
        for check in &self.exact_tests {
            if !check.verdict.success {
                out.push((check.name.clone(), check.verdict.message().to_string()));
            }
        }
        if let Some(v) = self.check_meta.as_ref().filter(|v| !v.success) {
            out.push(("metadata".to_string(), v.message().to_string()));
        }
        for (i, v) in self.frames.iter().enumerate() {
            if !v.success {
                out.push((format!("frame {i}"), v.message().to_string()));
            }
        }
        if let Some(v) = self.preview.as_ref().filter(|v| !v.success) {
            out.push(("preview".to_string(), v.message().to_string()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CaseRecord {
        let mut record = CaseRecord::new("case");
        record.check_meta = Some(Verdict::pass());
        record.exact_tests.push(BinaryCheck {
            name: "original.icc".into(),
            verdict: Verdict::pass(),
        });
        record.num_frames = Some(2);
        record.frames = vec![Verdict::pass(), Verdict::pass()];
        record
    }

    #[test]
    fn test_all_pass() {
        let record = complete().finish();
        assert!(record.success);
        assert!(record.failures().is_empty());
    }

    #[test]
    fn test_absent_preview_does_not_matter() {
        let mut record = complete();
        record.preview = None;
        assert!(record.finish().success);
    }

    #[test]
    fn test_any_failure_fails_case() {
        let mut record = complete();
        record.frames[1] = Verdict::fail("RMSE too large: 1 > 0");
        let record = record.finish();
        assert!(!record.success);
        assert_eq!(
            record.failures(),
            [("frame 1".to_string(), "RMSE too large: 1 > 0".to_string())]
        );

        let mut record = complete();
        record.preview = Some(Verdict::fail("File not decoded: decoded_preview.npy"));
        assert!(!record.finish().success);

        let mut record = complete();
        record.exact_tests[0].verdict = Verdict::fail("Binary files mismatch");
        assert!(!record.finish().success);
    }

    #[test]
    fn test_missing_metadata_verdict_is_failure() {
        let mut record = complete();
        record.check_meta = None;
        assert!(!record.finish().success);
    }

    #[test]
    fn test_abort_keeps_message() {
        let record = CaseRecord::new("x").abort(Verdict::fail("Running the decoder (d) returned error"));
        assert!(!record.success);
        assert_eq!(record.failures()[0].0, "case");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(complete().finish()).unwrap();
        assert_eq!(json["test_id"], "case");
        assert_eq!(json["exact_tests"][0]["name"], "original.icc");
        assert_eq!(json["exact_tests"][0]["success"], true);
        assert_eq!(json["num_frames"], 2);
        assert!(json.get("preview").is_none());
        assert!(json.get("message").is_none());
    }
}
