//! Corpus run command

use crate::RunArgs;
use anyhow::{Context, Result};
use conform_check::{run_corpus, CaseRecord, Decoder, RunConfig, RunSummary};
use conform_io::Corpus;
use std::io::Write;

pub fn run(args: RunArgs, jobs: usize) -> Result<bool> {
    let decoder = Decoder::from_command_line(&args.decoder).context("Invalid --decoder")?;
    let config = RunConfig {
        decoder,
        corpus: Corpus::open(&args.corpus),
        results: args.results,
        jobs,
    };

    let summary = run_corpus(&config)
        .with_context(|| format!("Conformance run over {} failed", args.corpus.display()))?;

    let mut out = std::io::stdout().lock();
    print_summary(&mut out, &summary)?;
    Ok(summary.success())
}

fn print_summary(out: &mut impl Write, summary: &RunSummary) -> std::io::Result<()> {
    for record in &summary.records {
        print_record(out, record)?;
    }
    let passed = summary.passed().count();
    let failed = summary.failed().count();
    writeln!(out, "{passed} passed, {failed} failed")?;
    if failed == 0 {
        writeln!(out, "PASS")
    } else {
        writeln!(out, "FAIL")
    }
}

fn print_record(out: &mut impl Write, record: &CaseRecord) -> std::io::Result<()> {
    let status = if record.success { "PASS" } else { "FAIL" };
    writeln!(out, "{status} {}", record.test_id)?;
    for (label, message) in record.failures() {
        writeln!(out, "  {label}: {message}")?;
    }
    Ok(())
}
