//! Descriptor checksum commands

use crate::{ListShasArgs, UpdateShaArgs, VerifyShasArgs};
use anyhow::{Context, Result};
use conform_io::checksums::{self, ChecksumStatus};
use std::io::Write;

pub fn list(args: ListShasArgs) -> Result<bool> {
    let shas = checksums::list_shas(&args.descriptor)
        .with_context(|| format!("Failed to read: {}", args.descriptor.display()))?;
    let mut out = std::io::stdout().lock();
    for (file, sha) in shas {
        writeln!(out, "{file} {sha}")?;
    }
    Ok(true)
}

pub fn update(args: UpdateShaArgs) -> Result<bool> {
    checksums::update_sha(&args.descriptor, &args.file, &args.sha)
        .with_context(|| format!("Failed to update: {}", args.descriptor.display()))?;
    tracing::info!(file = %args.file, descriptor = %args.descriptor.display(), "Checksum updated");
    Ok(true)
}

pub fn verify(args: VerifyShasArgs) -> Result<bool> {
    let statuses = checksums::verify_case(&args.case_dir)
        .with_context(|| format!("Failed to verify: {}", args.case_dir.display()))?;
    let mut out = std::io::stdout().lock();
    for status in &statuses {
        writeln!(out, "{}", status_line(status))?;
    }
    Ok(statuses.iter().all(ChecksumStatus::is_ok))
}

fn status_line(status: &ChecksumStatus) -> String {
    match &status.actual {
        None => format!("MISSING {}", status.file),
        Some(_) if status.is_ok() => format!("OK {}", status.file),
        Some(actual) => format!(
            "MISMATCH {} expected {} found {}",
            status.file, status.expected, actual
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn status(actual: Option<&str>) -> ChecksumStatus {
        ChecksumStatus {
            file: "input.jxl".into(),
            expected: "aa".into(),
            actual: actual.map(str::to_string),
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(&status(Some("aa"))), "OK input.jxl");
        assert_eq!(status_line(&status(None)), "MISSING input.jxl");
        assert_eq!(
            status_line(&status(Some("bb"))),
            "MISMATCH input.jxl expected aa found bb"
        );
    }

    #[test]
    fn test_verify_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("test.json"),
            r#"{"sha256sums": {"input.jxl": "00"}, "frames": []}"#,
        )
        .unwrap();
        fs::write(dir.path().join("input.jxl"), b"data").unwrap();

        let ok = verify(VerifyShasArgs {
            case_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_update_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("test.json");
        fs::write(&descriptor, r#"{"frames": []}"#).unwrap();

        assert!(update(UpdateShaArgs {
            file: "input.jxl".into(),
            sha: "abcd".into(),
            descriptor: descriptor.clone(),
        })
        .unwrap());
        assert_eq!(
            checksums::list_shas(&descriptor).unwrap(),
            [("input.jxl".to_string(), "abcd".to_string())]
        );
    }
}
