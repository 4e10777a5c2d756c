//! Stand-in decoder for end-to-end tests.
//!
//! Accepts the decoder command line the verifier builds and copies staged
//! files from the input's directory to the requested output paths. Staged
//! files that are absent are simply not written.

use anyhow::{bail, Context, Result};
use conform_tests::staged;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mock_decoder: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [input, output, flags @ ..] = args.as_slice() else {
        bail!("usage: mock_decoder <input> <output> [options]");
    };
    let case_dir = Path::new(input)
        .parent()
        .context("input has no parent directory")?
        .to_path_buf();
    record_call(&case_dir, &args)?;

    let exit_code = case_dir.join(staged::EXIT_CODE);
    if exit_code.exists() {
        let code: u8 = fs::read_to_string(&exit_code)?.trim().parse()?;
        return Ok(ExitCode::from(code));
    }

    if output.ends_with(".jpg") {
        stage(&case_dir, staged::RECONSTRUCTED_JPEG, Path::new(output))?;
        return Ok(ExitCode::SUCCESS);
    }
    stage(&case_dir, staged::IMAGE, Path::new(output))?;

    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        let source = match flag.as_str() {
            "--norender_spotcolors" => continue,
            "--preview_out" => staged::PREVIEW,
            "--orig_icc_out" => staged::ORIGINAL_ICC,
            "--metadata_out" => staged::METADATA,
            "--icc_out" => staged::ICC,
            other => bail!("unknown option {other}"),
        };
        let target: PathBuf = flags.next().context("option needs a path")?.into();
        stage(&case_dir, source, &target)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn stage(case_dir: &Path, name: &str, target: &Path) -> Result<()> {
    let source = case_dir.join(name);
    if source.exists() {
        fs::copy(&source, target)
            .with_context(|| format!("copy {} -> {}", source.display(), target.display()))?;
    }
    Ok(())
}

fn record_call(case_dir: &Path, args: &[String]) -> Result<()> {
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(case_dir.join(staged::CALLS))?;
    writeln!(log, "{}", args.join("\t"))?;
    Ok(())
}
