//! CLI argument definitions for the `dictionaria` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dictionaria",
    version,
    about = "Convert SFM dictionary submissions to CLDF datasets",
    long_about = "Convert Standard Format Marker dictionary submissions to CLDF Dictionary datasets.\n\n\
                  A submission is a directory with md.json and db.sfm, optionally\n\
                  examples.sfm, glosses.flextext, concepts.csv and media files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Repository root holding the media catalog (default: the submission's parent).
    #[arg(long = "repos", value_name = "DIR", global = true)]
    pub repos: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a submission to a CLDF dataset.
    Process(ProcessArgs),

    /// Report structural problems in a submission's db.sfm.
    Check(SubmissionArgs),

    /// Show marker statistics of a submission's db.sfm.
    Stat(SubmissionArgs),

    /// Number homonyms in db.sfm that share a headword.
    Repair(SubmissionArgs),

    /// List the submissions in a directory.
    Ls(LsArgs),
}

#[derive(Args)]
pub struct SubmissionArgs {
    /// Path to the submission directory.
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Path to the submission directory.
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,

    /// Output directory (default: <SUBMISSION>/processed).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Process and report without writing any files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct LsArgs {
    /// Directory holding one submission per subdirectory.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
