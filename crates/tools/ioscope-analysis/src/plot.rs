//! gnuplot data sources and command scripts.
//!
//! Only the inputs for gnuplot are produced here. Each `.do` script is
//! self-contained and can be rendered with `gnuplot <script>`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::model::Metric;
use crate::parse;
use crate::report::Reporter;

/// Raw conforming rows, source for the 3-D surface plots.
pub const RAW_DATASOURCE: &str = "3d-datasource";

/// Copy every conforming row of `raw` verbatim into the 3-D data source.
pub fn write_3d_datasource(reporter: &Reporter, raw: &str) -> Result<PathBuf> {
    let mut contents = String::new();
    for line in parse::conforming_lines(raw) {
        contents.push_str(line);
        contents.push('\n');
    }
    reporter.write_file(RAW_DATASOURCE, &contents)
}

/// Throughput against file size for one metric.
///
/// `datasource` holds the by-file-size rows: key in column 1, metrics from
/// column 2.
pub fn script_2d(metric: Metric, datasource: &Path, output_dir: &Path) -> String {
    let label = metric.label();
    let png = output_dir.join(format!("2d-{label}.png"));

    let mut s = String::new();
    let _ = writeln!(s, "set title 'Iozone performance: {label}'");
    let _ = writeln!(s, "set logscale x");
    let _ = writeln!(s, "set xlabel 'File size (KB)'");
    let _ = writeln!(s, "set ylabel 'Throughput (MB/s)'");
    let _ = writeln!(s, "set terminal png small size 450 350");
    let _ = writeln!(s, "set output '{}'", png.display());
    let _ = writeln!(
        s,
        "plot '{}' using 1:{} title '{label}' with lines",
        datasource.display(),
        metric.index() + 2
    );
    s
}

/// Parametric surface of file size × record size × throughput.
///
/// `datasource` holds raw rows: file size, record size, then the metrics from
/// column 3.
pub fn script_3d(metric: Metric, datasource: &Path, output_dir: &Path) -> String {
    let label = metric.label();
    let png = output_dir.join(format!("{label}.png"));

    let mut s = String::new();
    let _ = writeln!(s, "set title 'Iozone performance: {label}'");
    let _ = writeln!(s, "set grid lt 2 lw 1");
    let _ = writeln!(s, "set surface");
    let _ = writeln!(s, "set parametric");
    let _ = writeln!(s, "set xtics");
    let _ = writeln!(s, "set ytics");
    let _ = writeln!(s, "set logscale x 2");
    let _ = writeln!(s, "set logscale y 2");
    let _ = writeln!(s, "set logscale z");
    let _ = writeln!(s, "set xrange [2.**5:2.**24]");
    let _ = writeln!(s, "set xlabel 'File size (KB)'");
    let _ = writeln!(s, "set ylabel 'Record size (KB)'");
    let _ = writeln!(s, "set zlabel 'Throughput (KB/s)'");
    let _ = writeln!(s, "set style data lines");
    let _ = writeln!(s, "set dgrid3d 80,80, 3");
    let _ = writeln!(s, "set terminal png small size 900 700");
    let _ = writeln!(s, "set output '{}'", png.display());
    let _ = writeln!(
        s,
        "splot '{}' using 1:2:{} title '{label}'",
        datasource.display(),
        metric.index() + 3
    );
    s
}

/// Write a 2-D and a 3-D script for every metric.
///
/// Returns the script paths in metric order, 2-D before 3-D.
pub fn write_scripts(
    reporter: &Reporter,
    file_datasource: &Path,
    raw_datasource: &Path,
) -> Result<Vec<PathBuf>> {
    let out_dir = reporter.output_dir();
    let mut written = Vec::with_capacity(Metric::ALL.len() * 2);

    for metric in Metric::ALL {
        let label = metric.label();
        written.push(reporter.write_file(
            &format!("2d-{label}.do"),
            &script_2d(metric, file_datasource, out_dir),
        )?);
        written.push(reporter.write_file(
            &format!("{label}.do"),
            &script_3d(metric, raw_datasource, out_dir),
        )?);
    }

    Ok(written)
}
