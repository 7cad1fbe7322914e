//! Tabular text rendering and headerless data files.
//!
//! Rendering is pure (`render_*` return strings); [`Reporter`] owns the
//! output directory and is the only thing that touches the filesystem.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::aggregate::Analysis;
use crate::compare::{CellOutcome, ComparisonResult, Delta, Threshold};
use crate::model::{AggregatedMatrix, GroupBy, Metric};

/// Headerless by-file-size rows, x axis of the 2-D plots.
pub const FILE_DATASOURCE: &str = "2d-datasource-file";
/// Headerless by-record-size rows.
pub const RECORD_DATASOURCE: &str = "2d-datasource-record";

/// Render a table with a dashed rule under the header.
///
/// The first column is left-aligned, the rest right-aligned.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, header.iter().copied(), &widths);
    push_rule(&mut out, &widths);
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    out.push_str("  ");
    for (i, (cell, &width)) in cells.zip(widths).enumerate() {
        if i == 0 {
            let _ = write!(out, "{cell:<width$}");
        } else {
            let _ = write!(out, "  {cell:>width$}");
        }
    }
    out.push('\n');
}

fn push_rule(out: &mut String, widths: &[usize]) {
    out.push_str("  ");
    for (i, &width) in widths.iter().enumerate() {
        if i == 0 {
            let _ = write!(out, "{:-<width$}", "");
        } else {
            let _ = write!(out, "  {:->width$}", "");
        }
    }
    out.push('\n');
}

fn header(group_by: GroupBy) -> Vec<&'static str> {
    let mut header = vec![group_by.key_header()];
    header.extend(Metric::ALL.iter().map(|m| m.header()));
    header
}

fn key_cell(key: Option<u64>) -> String {
    key.map_or_else(|| "ALL".to_string(), |k| k.to_string())
}

/// Render one aggregated matrix as a table.
pub fn render_matrix(matrix: &AggregatedMatrix) -> String {
    let rows: Vec<Vec<String>> = matrix
        .rows
        .iter()
        .map(|row| {
            std::iter::once(key_cell(row.key))
                .chain(row.values.iter().map(u64::to_string))
                .collect()
        })
        .collect();
    render_table(&header(matrix.group_by), &rows)
}

/// Render the three summaries of one results file.
pub fn render_analysis(analysis: &Analysis) -> String {
    if analysis.is_empty() {
        return "  No IOzone result rows to display.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nTABLE:  SUMMARY of ALL FILE and RECORD SIZES           Results in MB/sec\n"
    );
    out.push_str(&render_matrix(&analysis.overall));
    let _ = writeln!(out, "\nDRILLED DATA:");
    let _ = writeln!(
        out,
        "\nTABLE:  RECORD Size against all FILE Sizes             Results in MB/sec\n"
    );
    out.push_str(&render_matrix(&analysis.by_record_size));
    let _ = writeln!(
        out,
        "\nTABLE:  FILE Size against all RECORD Sizes             Results in MB/sec\n"
    );
    out.push_str(&render_matrix(&analysis.by_file_size));
    out
}

fn delta_cell(delta: Delta, threshold: Threshold) -> String {
    match (delta, delta.classify(threshold)) {
        (_, CellOutcome::Undefined) | (Delta::Undefined, _) => "n/a".to_string(),
        (_, CellOutcome::Unchanged) => ".".to_string(),
        (Delta::Defined(pct), CellOutcome::Improvement) => format!("+{pct:.2}"),
        (Delta::Defined(pct), CellOutcome::Regression) => format!("{pct:.2}"),
    }
}

fn pct_cell(pct: Option<f64>) -> String {
    pct.map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}%"))
}

/// One-line regression/improvement tally.
pub fn render_tally(result: &ComparisonResult) -> String {
    let mut line = format!(
        "REGRESSIONS: {} ({})    Improvements: {} ({})",
        result.regressions,
        pct_cell(result.regression_pct()),
        result.improvements,
        pct_cell(result.improvement_pct()),
    );
    if result.undefined > 0 {
        let _ = write!(line, "    Undefined: {}", result.undefined);
    }
    line
}

/// Render one comparison as a `% DIFF` table followed by its tally.
pub fn render_comparison(result: &ComparisonResult) -> String {
    let title = match result.group_by {
        GroupBy::None => "ALL sizes",
        GroupBy::RecordSize => "RECsize",
        GroupBy::FileSize => "FILEsize",
    };

    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            std::iter::once(key_cell(row.key))
                .chain(row.cells.iter().map(|d| delta_cell(*d, result.threshold)))
                .collect()
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nTABLE:  {title} Difference between runs               Results are % DIFF\n"
    );
    out.push_str(&render_table(&header(result.group_by), &rows));
    let _ = writeln!(out, "{}", render_tally(result));
    out
}

/// Render every comparison of a two-run analysis.
pub fn render_comparisons(results: &[ComparisonResult]) -> String {
    let Some(first) = results.first() else {
        return "  Nothing to compare.\n".to_string();
    };

    let mut out = format!(
        "ANALYSIS of DRILLED DATA (threshold: {}%):\n",
        first.threshold.percent()
    );
    for result in results {
        out.push_str(&render_comparison(result));
    }
    out
}

/// Headerless rows for an external plotting tool: key, then the 13 values.
pub fn datasource(matrix: &AggregatedMatrix) -> String {
    let mut out = String::new();
    for row in &matrix.rows {
        let mut first = true;
        if let Some(key) = row.key {
            let _ = write!(out, "{key}");
            first = false;
        }
        for value in row.values {
            if !first {
                out.push(' ');
            }
            let _ = write!(out, "{value}");
            first = false;
        }
        out.push('\n');
    }
    out
}

/// Paths of the headerless data files written for one analysis.
#[derive(Debug, Clone)]
pub struct Datasources {
    /// Rows aggregated by file size.
    pub by_file_size: PathBuf,
    /// Rows aggregated by record size.
    pub by_record_size: PathBuf,
}

/// Writes reports and data files into one output directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    /// Create a reporter rooted at `output_dir`; the directory is created on
    /// first write.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating output directory {}", self.output_dir.display()))
    }

    /// Write `contents` to `name` inside the output directory, replacing any
    /// existing file.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.output_dir.join(name);
        std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Write the by-file-size and by-record-size data files.
    pub fn write_datasources(&self, analysis: &Analysis) -> Result<Datasources> {
        Ok(Datasources {
            by_file_size: self.write_file(FILE_DATASOURCE, &datasource(&analysis.by_file_size))?,
            by_record_size: self
                .write_file(RECORD_DATASOURCE, &datasource(&analysis.by_record_size))?,
        })
    }
}
