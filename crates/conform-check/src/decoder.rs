//! The decoder under test, invoked as an external process.

use crate::{RunError, RunResult};
use conform_io::TestDescriptor;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Command prefix that runs the decoder, e.g. `["djxl"]` or `["wrapper", "--fast"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    argv: Vec<OsString>,
}

impl Decoder {
    /// Wraps a program and its leading arguments.
    pub fn new<I, S>(argv: I) -> RunResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(RunError::EmptyDecoder);
        }
        Ok(Self { argv })
    }

    /// Parses a shell-style command line such as `"'my decoder' --threads 1"`.
    pub fn from_command_line(command: &str) -> RunResult<Self> {
        Self::new(split_command(command)?)
    }

    /// Primary invocation producing pixels, ICC profile and metadata.
    ///
    /// Optional outputs are requested only when the descriptor declares them.
    /// Spot colors are never rendered so pixel comparison stays well defined.
    pub fn primary_command(
        &self,
        input: &Path,
        outputs: &DecodeOutputs,
        descriptor: &TestDescriptor,
    ) -> CommandLine {
        let mut cmd = self.command(input, &outputs.image());
        if descriptor.preview().is_some() {
            cmd.flag_path("--preview_out", &outputs.preview());
        }
        if descriptor.has_original_icc() {
            cmd.flag_path("--orig_icc_out", &outputs.original_icc());
        }
        cmd.flag_path("--metadata_out", &outputs.metadata());
        cmd.flag_path("--icc_out", &outputs.icc());
        cmd.push("--norender_spotcolors");
        cmd
    }

    /// Invocation reconstructing the legacy JPEG bitstream.
    pub fn jpeg_command(&self, input: &Path, outputs: &DecodeOutputs) -> CommandLine {
        self.command(input, &outputs.reconstructed_jpeg())
    }

    fn command(&self, input: &Path, output: &Path) -> CommandLine {
        let mut args = self.argv.clone();
        args.push(input.into());
        args.push(output.into());
        CommandLine { args }
    }
}

/// A fully built decoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<OsString>,
}

impl CommandLine {
    fn push(&mut self, arg: impl Into<OsString>) {
        self.args.push(arg.into());
    }

    fn flag_path(&mut self, flag: &str, path: &Path) {
        self.push(flag);
        self.push(path);
    }

    /// Arguments as text for reports.
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Runs the command to completion with inherited stdio.
    ///
    /// Returns true only for a zero exit status; a process that cannot be
    /// spawned counts as a failure.
    pub fn run(&self) -> bool {
        info!("Running: {:?}", self.display_args());
        let Some((program, args)) = self.args.split_first() else {
            return false;
        };
        match Command::new(program).args(args).status() {
            Ok(status) => {
                debug!(%status, "Decoder exited");
                status.success()
            }
            Err(e) => {
                debug!(error = %e, "Decoder could not be started");
                false
            }
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_args().join(" "))
    }
}

/// Where the decoder writes its outputs inside a case's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutputs {
    dir: PathBuf,
}

impl DecodeOutputs {
    /// File name of the decoded pixel buffer.
    pub const IMAGE: &'static str = "decoded_image.npy";
    /// File name of the decoded preview buffer.
    pub const PREVIEW: &'static str = "decoded_preview.npy";
    /// File name of the decoded metadata tree.
    pub const METADATA: &'static str = "meta.json";
    /// File name of the profile the decoded pixels are in.
    pub const ICC: &'static str = "decoded.icc";
    /// File name of the reconstructed legacy JPEG; matches its reference name.
    pub const RECONSTRUCTED_JPEG: &'static str = crate::case::RECONSTRUCTED_JPEG;
    /// File name of the original embedded profile as extracted by the decoder.
    pub const ORIGINAL_ICC: &'static str = "decoded_org.icc";

    /// Output layout rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Decoded pixels of every frame.
    pub fn image(&self) -> PathBuf {
        self.dir.join(Self::IMAGE)
    }

    /// Decoded preview pixels.
    pub fn preview(&self) -> PathBuf {
        self.dir.join(Self::PREVIEW)
    }

    /// Reconstructed legacy JPEG.
    pub fn reconstructed_jpeg(&self) -> PathBuf {
        self.dir.join(Self::RECONSTRUCTED_JPEG)
    }

    /// Original embedded ICC profile as extracted by the decoder.
    pub fn original_icc(&self) -> PathBuf {
        self.dir.join(Self::ORIGINAL_ICC)
    }

    /// Decoded metadata tree.
    pub fn metadata(&self) -> PathBuf {
        self.dir.join(Self::METADATA)
    }

    /// Profile of the decoded pixels.
    pub fn icc(&self) -> PathBuf {
        self.dir.join(Self::ICC)
    }
}

/// Splits a command line into words using POSIX shell quoting rules.
///
/// Supports single quotes, double quotes (with `\"`, `\\`, `\$` and `` \` ``
/// escapes) and backslash escapes outside quotes. No expansion is performed.
pub fn split_command(command: &str) -> RunResult<Vec<String>> {
    let bad = || RunError::BadDecoderCommand(command.to_string());
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next().ok_or_else(bad)? {
                        '\'' => break,
                        other => word.push(other),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next().ok_or_else(bad)? {
                        '"' => break,
                        '\\' => match chars.next().ok_or_else(bad)? {
                            escaped @ ('"' | '\\' | '$' | '`') => word.push(escaped),
                            '\n' => {}
                            other => {
                                word.push('\\');
                                word.push(other);
                            }
                        },
                        other => word.push(other),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next().ok_or_else(bad)? {
                    '\n' => {}
                    other => word.push(other),
                }
            }
            other => {
                in_word = true;
                word.push(other);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}
