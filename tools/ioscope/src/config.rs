//! `ioscope.toml` loading and resolution.
//!
//! Every field is optional. Resolution order is CLI flag, then the config
//! file, then the built-in default. Relative paths in the file are taken
//! relative to the directory containing it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ioscope_analysis::Threshold;
use serde::Deserialize;

use crate::verbose::vprintln;

/// Name of the configuration file searched for in parent directories.
pub const CONFIG_FILE: &str = "ioscope.toml";

/// Contents of `ioscope.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Regression/improvement threshold in percent.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Directory receiving `raw_output`, `analysis/` and `keyval.json`.
    #[serde(default = "default_output_dir", rename = "output-dir")]
    pub output_dir: PathBuf,
    /// Baseline run to compare against.
    #[serde(default, rename = "previous-results")]
    pub previous_results: Option<PathBuf>,
    /// IOzone arguments that produced the results.
    #[serde(default = "default_args")]
    pub args: String,
    /// Write gnuplot data sources and scripts.
    #[serde(default = "default_plot")]
    pub plot: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            output_dir: default_output_dir(),
            previous_results: None,
            args: default_args(),
            plot: default_plot(),
        }
    }
}

fn default_threshold() -> f64 {
    Threshold::DEFAULT.percent()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_args() -> String {
    "-a".into()
}
fn default_plot() -> bool {
    true
}

/// Values given on the command line, each overriding the config file.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    /// `--output`.
    pub output_dir: Option<&'a Path>,
    /// `--previous`.
    pub previous_results: Option<&'a Path>,
    /// `--threshold`.
    pub threshold: Option<f64>,
    /// `--args`.
    pub args: Option<&'a str>,
    /// `--no-plot`.
    pub no_plot: bool,
}

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Config file the settings were read from, if any.
    pub source: Option<PathBuf>,
    /// Classification threshold.
    pub threshold: Threshold,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Baseline run, enabling two-run comparison.
    pub previous_results: Option<PathBuf>,
    /// IOzone argument string.
    pub args: String,
    /// Whether to write gnuplot inputs.
    pub plot: bool,
}

/// Find `ioscope.toml` in the current directory or any parent.
pub fn find_config() -> Result<Option<PathBuf>> {
    let mut dir = std::env::current_dir().context("failed to get current directory")?;
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        if !dir.pop() {
            return Ok(None);
        }
    }
}

/// Parse a config file.
pub fn load_file(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse(contents: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Load the explicit or discovered config file and apply CLI overrides.
pub fn resolve(explicit: Option<&Path>, overrides: &Overrides<'_>) -> Result<ResolvedConfig> {
    let source = match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => find_config()?,
    };

    let file = match &source {
        Some(path) => load_file(path)?,
        None => ConfigFile::default(),
    };

    merge(file, source, overrides)
}

/// Apply CLI overrides on top of a parsed config file.
fn merge(
    file: ConfigFile,
    source: Option<PathBuf>,
    overrides: &Overrides<'_>,
) -> Result<ResolvedConfig> {
    let base = source
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let threshold_pct = overrides.threshold.unwrap_or(file.threshold);
    let threshold = Threshold::new(threshold_pct).context("invalid threshold")?;

    let output_dir = match overrides.output_dir {
        Some(dir) => dir.to_path_buf(),
        None => base.join(&file.output_dir),
    };
    let previous_results = match overrides.previous_results {
        Some(path) => Some(path.to_path_buf()),
        None => file.previous_results.map(|p| base.join(p)),
    };

    Ok(ResolvedConfig {
        source,
        threshold,
        output_dir,
        previous_results,
        args: overrides.args.map_or(file.args, String::from),
        plot: file.plot && !overrides.no_plot,
    })
}

/// Print the resolved settings in verbose mode.
pub fn print_resolved(config: &ResolvedConfig) {
    match &config.source {
        Some(path) => vprintln!("Config: {}", path.display()),
        None => vprintln!("Config: built-in defaults"),
    }
    vprintln!("  threshold        = {}%", config.threshold.percent());
    vprintln!("  output-dir       = {}", config.output_dir.display());
    match &config.previous_results {
        Some(path) => vprintln!("  previous-results = {}", path.display()),
        None => vprintln!("  previous-results = (none)"),
    }
    vprintln!("  args             = {}", config.args);
    vprintln!("  plot             = {}", config.plot);
}
