//! Command-line arguments for `paramdep`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use paramdep_cli::report::Assignment;

#[derive(Parser)]
#[command(
    name = "paramdep",
    version,
    about = "Inspect and evaluate parameter lists with dependency rules",
    long_about = "Read parameter-list documents carrying validators and dependencies.\n\n\
                  Lists dependencies, evaluates visibility and validators for given\n\
                  values, and rewrites documents in canonical form."
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

    /// Log output format.
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

    /// Prefix log lines with timestamps.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Include the emitting module in log lines.
    #[arg(long = "log-target", global = true)]
    pub log_target: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the dependencies of a document.
    Inspect(InspectArgs),

    /// Evaluate visibility and validators of every entry.
    Check(CheckArgs),

    /// Read a document and write it back in canonical form.
    Normalize(NormalizeArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// Parameter-list document to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Leave out dependencies that fail to load instead of failing.
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Override an entry value before evaluating (repeatable).
    ///
    /// Arrays take comma-separated items.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<Assignment>,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Output path (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
