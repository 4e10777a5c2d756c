//! jxl-conformance - JPEG XL decoder conformance verifier
//!
//! Runs a decoder over a reference corpus and checks its output, and
//! maintains the checksum lists kept in test descriptors.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "jxl-conformance")]
#[command(author, version, about = "JPEG XL decoder conformance verifier")]
#[command(long_about = "
Checks a JPEG XL decoder against a conformance corpus. The decoder is run as
an external process for every case and its pixels, ICC profile, metadata and
reconstructed JPEG are compared with the reference files.

Examples:
  jxl-conformance run --decoder djxl --corpus conformance/testcases
  jxl-conformance run --decoder 'djxl --num_threads 1' --corpus subset.txt --results out.json
  jxl-conformance -j 8 run --decoder djxl --corpus conformance/testcases
  jxl-conformance list-shas testcases/alpha_triangles/test.json
  jxl-conformance update-sha input.jxl 9f86d0... testcases/alpha_triangles/test.json
  jxl-conformance verify-shas testcases/alpha_triangles
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of test cases run at once (0 or 1 = sequential)
    #[arg(short = 'j', long, global = true, default_value = "1")]
    jobs: usize,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decoder over a corpus and check its output
    Run(RunArgs),

    /// Print the checksums listed in a test descriptor
    #[command(name = "list-shas")]
    ListShas(ListShasArgs),

    /// Set one checksum in a test descriptor
    #[command(name = "update-sha")]
    UpdateSha(UpdateShaArgs),

    /// Recompute and check the checksums of a case directory
    #[command(name = "verify-shas")]
    VerifyShas(VerifyShasArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Decoder command, split with shell quoting rules
    #[arg(long)]
    decoder: String,

    /// Corpus directory (uses corpus.txt) or index file
    #[arg(long)]
    corpus: PathBuf,

    /// Write per-case results as JSON
    #[arg(long)]
    results: Option<PathBuf>,
}

#[derive(Args)]
struct ListShasArgs {
    /// Test descriptor (test.json)
    descriptor: PathBuf,
}

#[derive(Args)]
struct UpdateShaArgs {
    /// File name, relative to the case directory
    file: String,

    /// Hex SHA-256 digest
    sha: String,

    /// Test descriptor (test.json)
    descriptor: PathBuf,
}

#[derive(Args)]
struct VerifyShasArgs {
    /// Case directory containing test.json
    case_dir: PathBuf,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let success = match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.jobs)?,
        Commands::ListShas(args) => commands::shas::list(args)?,
        Commands::UpdateSha(args) => commands::shas::update(args)?,
        Commands::VerifyShas(args) => commands::shas::verify(args)?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Installs the global subscriber. The returned guard flushes the log file on drop.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
