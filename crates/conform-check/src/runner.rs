//! Corpus-wide runs.

use crate::case::run_case;
use crate::decoder::Decoder;
use crate::report::CaseRecord;
use crate::{RunError, RunResult};
use conform_io::Corpus;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings for one conformance run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Decoder under test.
    pub decoder: Decoder,
    /// Cases to run.
    pub corpus: Corpus,
    /// Where to write the per-case records as JSON, if anywhere.
    pub results: Option<PathBuf>,
    /// Cases run concurrently; 0 or 1 runs them one after another.
    pub jobs: usize,
}

impl RunConfig {
    /// Sequential run without a results file.
    pub fn new(decoder: Decoder, corpus: Corpus) -> Self {
        Self {
            decoder,
            corpus,
            results: None,
            jobs: 1,
        }
    }
}

/// Records of a finished run, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// One record per case id.
    pub records: Vec<CaseRecord>,
}

impl RunSummary {
    /// True when every case succeeded.
    pub fn success(&self) -> bool {
        self.records.iter().all(|r| r.success)
    }

    /// Cases that succeeded.
    pub fn passed(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter().filter(|r| r.success)
    }

    /// Cases that failed.
    pub fn failed(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter().filter(|r| !r.success)
    }
}

/// Runs every case listed in the corpus index.
///
/// Individual case failures are recorded, not returned. An error here means
/// the index could not be read, the worker pool could not start or the
/// results file could not be written.
pub fn run_corpus(config: &RunConfig) -> RunResult<RunSummary> {
    let ids = config.corpus.case_ids().map_err(RunError::Index)?;
    info!(cases = ids.len(), index = %config.corpus.index().display(), "Starting run");

    let run = |id: &String| run_case(&config.decoder, &config.corpus, id);
    let records: Vec<CaseRecord> = if config.jobs <= 1 {
        ids.iter().map(run).collect()
    } else {
        debug!(jobs = config.jobs, "Running cases in parallel");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()?;
        pool.install(|| ids.par_iter().map(run).collect())
    };

    let summary = RunSummary { records };
    if let Some(path) = &config.results {
        conform_io::write_json(path, &summary.records).map_err(RunError::Results)?;
        info!(path = %path.display(), "Results written");
    }
    info!(
        passed = summary.passed().count(),
        failed = summary.failed().count(),
        "Run finished"
    );
    Ok(summary)
}
