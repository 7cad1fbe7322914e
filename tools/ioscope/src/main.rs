//! IOzone result analyzer.
//!
//! Reads the raw output of an `iozone -a` run, prints geometric-mean
//! summaries by file size and record size, and, given a previous run,
//! flags per-cell regressions and improvements.
//!
//! Pipeline: resolve config → parse → aggregate → (compare) → write reports,
//!           data sources, gnuplot scripts and keyval JSON.

mod analyze_cmd;
mod cli;
mod config;
mod verbose;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // JSON goes to stdout, so progress output must stay out of it.
    let json_stdout = matches!(&cli.command, cli::Command::Analyze(args) if args.format == "json");
    verbose::init(cli.quiet || json_stdout, cli.verbose);

    match cli.command {
        cli::Command::Analyze(ref args) => analyze_cmd::cmd_analyze(args, cli.config.as_deref()),
        cli::Command::Keyval(ref args) => analyze_cmd::cmd_keyval(args, cli.config.as_deref()),
    }
}
