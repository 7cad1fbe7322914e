//! End-to-end tests over captured `iozone -a` output.

use std::path::PathBuf;

use ioscope_analysis::model::METRIC_COUNT;
use ioscope_analysis::report::{self, Reporter};
use ioscope_analysis::{Analysis, GroupBy, Threshold, compare, compare_checked, parse};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn analyze(name: &str) -> Analysis {
    let rows = parse::parse_file(&fixture(name)).expect("fixture should parse");
    Analysis::from_matrix(&rows)
}

#[test]
fn parses_only_table_rows() {
    let rows = parse::parse_file(&fixture("auto-baseline.txt")).unwrap();
    assert_eq!(rows.len(), 11);
    assert_eq!((rows[0].file_size, rows[0].record_size), (64, 4));
    assert_eq!((rows[10].file_size, rows[10].record_size), (128, 128));
}

#[test]
fn groupings_follow_first_seen_order() {
    let analysis = analyze("auto-baseline.txt");

    assert_eq!(analysis.overall.len(), 1);
    assert_eq!(analysis.overall.group_by, GroupBy::None);

    let files: Vec<_> = analysis.by_file_size.keys().flatten().collect();
    assert_eq!(files, vec![64, 128]);

    let records: Vec<_> = analysis.by_record_size.keys().flatten().collect();
    assert_eq!(records, vec![4, 8, 16, 32, 64, 128]);
}

#[test]
fn run_against_itself_is_unchanged() {
    let analysis = analyze("auto-baseline.txt");
    for matrix in [&analysis.by_file_size, &analysis.by_record_size] {
        let result = compare(matrix, matrix, Threshold::DEFAULT);
        assert_eq!(result.regressions, 0);
        assert_eq!(result.improvements, 0);
        assert_eq!(result.total, matrix.len() * METRIC_COUNT);
    }
}

#[test]
fn slower_run_regresses_everywhere() {
    let baseline = analyze("auto-baseline.txt");
    let slower = analyze("auto-slower.txt");

    let by_record = compare_checked(
        &baseline.by_record_size,
        &slower.by_record_size,
        Threshold::DEFAULT,
    )
    .unwrap();
    assert_eq!(by_record.regressions, by_record.total);
    assert_eq!(by_record.regression_pct(), Some(100.0));

    // Swapping the roles turns every regression into an improvement.
    let reversed = compare(&slower.by_file_size, &baseline.by_file_size, Threshold::DEFAULT);
    assert_eq!(reversed.improvements, reversed.total);

    let text = report::render_comparisons(&[by_record, reversed]);
    assert!(text.contains("RECsize Difference between runs"));
    assert!(text.contains("FILEsize Difference between runs"));
    assert!(text.contains("REGRESSIONS: 78 (100.00%)"));
}

#[test]
fn reporter_writes_report_and_datasources() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = analyze("auto-baseline.txt");
    let reporter = Reporter::new(dir.path());

    let report = reporter
        .write_file("report.txt", &report::render_analysis(&analysis))
        .unwrap();
    let sources = reporter.write_datasources(&analysis).unwrap();

    let text = std::fs::read_to_string(report).unwrap();
    assert!(text.contains("DRILLED DATA:"));

    let by_file = std::fs::read_to_string(sources.by_file_size).unwrap();
    assert_eq!(by_file.lines().count(), 2);
    for line in by_file.lines() {
        assert_eq!(line.split_whitespace().count(), 1 + METRIC_COUNT);
    }
}
