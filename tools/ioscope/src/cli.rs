//! Command-line interface definitions for ioscope.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Summarize and compare IOzone benchmark runs.
#[derive(Parser)]
#[command(name = "ioscope", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ioscope.toml in the current or a parent directory).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Suppress tables and progress; show only warnings and errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show resolved configuration, written files and timings.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Summarize an IOzone run, optionally comparing it against a previous run.
    Analyze(AnalyzeArgs),
    /// Print the flat key/value extraction of an IOzone run as JSON.
    Keyval(KeyvalArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Raw IOzone output of the run to analyze.
    pub results: PathBuf,

    /// Raw IOzone output of a previous run to use as the comparison baseline.
    #[arg(long, short = 'p')]
    pub previous: Option<PathBuf>,

    /// Output directory (default: results).
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Regression/improvement threshold as a percentage (default: 5).
    #[arg(long)]
    pub threshold: Option<f64>,

    /// IOzone arguments that produced the results (default: -a).
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Output format for the summary printed to stdout: table or json.
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Do not write gnuplot data sources and scripts.
    #[arg(long)]
    pub no_plot: bool,
}

/// Arguments for the `keyval` subcommand.
#[derive(Parser)]
pub struct KeyvalArgs {
    /// Raw IOzone output to extract from.
    pub results: PathBuf,

    /// IOzone arguments that produced the results (default: -a).
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,
}
