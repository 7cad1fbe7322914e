//! CLI entry points for `ioscope analyze` and `ioscope keyval`.
//!
//! Bridges the analysis library (parser, aggregator, comparator, reporter,
//! plot scripts, keyval) to the command line and the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ioscope_analysis::keyval::{self, Mode};
use ioscope_analysis::report::{self, Reporter};
use ioscope_analysis::{Analysis, ComparisonResult, Threshold, compare_checked, parse, plot};
use serde::Serialize;

use crate::cli::{AnalyzeArgs, KeyvalArgs};
use crate::config::{self, Overrides, ResolvedConfig};
use crate::verbose::{StepTimer, dprintln, vprintln, wprintln};

/// Copy of the benchmark stdout inside the output directory.
const RAW_OUTPUT: &str = "raw_output";
/// Subdirectory holding reports, data sources and plot scripts.
const ANALYSIS_DIR: &str = "analysis";
const REPORT_FILE: &str = "report.txt";
const COMPARISON_FILE: &str = "comparison.txt";
const KEYVAL_FILE: &str = "keyval.json";

/// Stdout format of `analyze`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Format {
    Table,
    Json,
}

impl Format {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => bail!("unknown output format '{other}' (expected: table, json)"),
        }
    }
}

/// `--format json` document.
#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a Path,
    previous_results: Option<&'a Path>,
    threshold: f64,
    analysis: &'a Analysis,
    comparisons: &'a [ComparisonResult],
}

/// `ioscope analyze`: summarize one run and optionally compare it to a
/// previous one.
pub fn cmd_analyze(args: &AnalyzeArgs, config_path: Option<&Path>) -> Result<()> {
    let format = Format::parse(&args.format)?;
    let config = config::resolve(
        config_path,
        &Overrides {
            output_dir: args.output.as_deref(),
            previous_results: args.previous.as_deref(),
            threshold: args.threshold,
            args: args.args.as_deref(),
            no_plot: args.no_plot,
        },
    )?;
    config::print_resolved(&config);

    let raw = read_results(&args.results)?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let raw_copy = config.output_dir.join(RAW_OUTPUT);
    std::fs::write(&raw_copy, &raw).with_context(|| format!("writing {}", raw_copy.display()))?;
    vprintln!("  wrote {}", raw_copy.display());

    let reporter = Reporter::new(config.output_dir.join(ANALYSIS_DIR));
    dprintln!("Results will be stored in {}", reporter.output_dir().display());
    dprintln!("FILE: {}", args.results.display());

    let current = analyze_text(&raw, &args.results, "analysis");
    let summary = report::render_analysis(&current);
    if format == Format::Table {
        dprintln!("{summary}");
    }
    written(&reporter.write_file(REPORT_FILE, &summary)?);

    let sources = reporter.write_datasources(&current)?;
    written(&sources.by_file_size);
    written(&sources.by_record_size);

    let comparisons = match &config.previous_results {
        Some(previous) => compare_runs(previous, &current, config.threshold, &reporter, format)?,
        None => Vec::new(),
    };

    let kv = keyval::extract(&raw, Mode::detect(&config.args));
    let kv_path = config.output_dir.join(KEYVAL_FILE);
    std::fs::write(&kv_path, keyval::to_json(&kv)?)
        .with_context(|| format!("writing {}", kv_path.display()))?;
    written(&kv_path);

    if config.plot {
        write_plot_inputs(&reporter, &raw, &sources.by_file_size)?;
    }

    if format == Format::Json {
        let doc = JsonReport {
            results: &args.results,
            previous_results: config.previous_results.as_deref(),
            threshold: config.threshold.percent(),
            analysis: &current,
            comparisons: &comparisons,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("serializing report to JSON")?
        );
    }

    summarize(&config, &comparisons);
    Ok(())
}

/// `ioscope keyval`: print the key/value extraction as JSON.
pub fn cmd_keyval(args: &KeyvalArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::resolve(
        config_path,
        &Overrides {
            args: args.args.as_deref(),
            ..Overrides::default()
        },
    )?;
    let raw = read_results(&args.results)?;

    let mode = Mode::detect(&config.args);
    let kv = keyval::extract(&raw, mode);
    if kv.is_empty() {
        wprintln!("no key/value pairs found in {}", args.results.display());
    }
    println!("{}", keyval::to_json(&kv)?);
    Ok(())
}

fn read_results(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading results file {}", path.display()))
}

fn written(path: &Path) {
    vprintln!("  wrote {}", path.display());
}

/// Parse and aggregate one run, warning when it holds no table rows.
fn analyze_text(raw: &str, path: &Path, label: &'static str) -> Analysis {
    let _step = StepTimer::start(label);
    let rows = parse::parse_str(raw);
    vprintln!("  {} result rows in {}", rows.len(), path.display());
    if rows.is_empty() {
        wprintln!(
            "no IOzone result rows in {} (auto mode `-a` output expected)",
            path.display()
        );
    }
    Analysis::from_matrix(&rows)
}

/// Compare the current run against `previous` for every grouping.
///
/// Groupings whose size grids differ between the runs are skipped with a
/// warning; the rest are still reported.
fn compare_runs(
    previous: &Path,
    current: &Analysis,
    threshold: Threshold,
    reporter: &Reporter,
    format: Format,
) -> Result<Vec<ComparisonResult>> {
    dprintln!("FILE: {} (baseline)", previous.display());
    let raw = read_results(previous)?;
    let baseline = analyze_text(&raw, previous, "baseline analysis");
    if format == Format::Table {
        dprintln!("{}", report::render_analysis(&baseline));
    }

    let pairs = [
        ("overall", &baseline.overall, &current.overall),
        ("record size", &baseline.by_record_size, &current.by_record_size),
        ("file size", &baseline.by_file_size, &current.by_file_size),
    ];

    let mut results = Vec::with_capacity(pairs.len());
    for (name, base, cand) in pairs {
        match compare_checked(base, cand, threshold) {
            Ok(result) => results.push(result),
            Err(e) => wprintln!("skipping {name} comparison: {e}"),
        }
    }

    let text = report::render_comparisons(&results);
    if format == Format::Table {
        dprintln!("{text}");
    }
    written(&reporter.write_file(COMPARISON_FILE, &text)?);
    Ok(results)
}

fn write_plot_inputs(reporter: &Reporter, raw: &str, file_source: &Path) -> Result<()> {
    let raw_source = plot::write_3d_datasource(reporter, raw)?;
    written(&raw_source);

    let scripts: Vec<PathBuf> = plot::write_scripts(reporter, file_source, &raw_source)?;
    for script in &scripts {
        written(script);
    }
    dprintln!(
        "Wrote {} gnuplot scripts to {} (render with `gnuplot <script>`)",
        scripts.len(),
        reporter.output_dir().display()
    );
    Ok(())
}

fn summarize(config: &ResolvedConfig, comparisons: &[ComparisonResult]) {
    if comparisons.is_empty() {
        dprintln!("Analysis complete.");
        return;
    }

    let regressions: usize = comparisons.iter().map(|c| c.regressions).sum();
    if regressions > 0 {
        dprintln!(
            "Analysis complete: {regressions} regressed cell(s) beyond {}%.",
            config.threshold.percent()
        );
    } else {
        dprintln!("Analysis complete: no regressions detected.");
    }
}
