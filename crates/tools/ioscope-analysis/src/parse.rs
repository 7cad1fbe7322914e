//! IOzone text output parser.
//!
//! Real IOzone output interleaves the result table with banners, column
//! headers and blank lines. Only lines made of exactly 15 integers are result
//! rows; everything else is skipped without error. A negative integer
//! converts but is not a valid size or throughput, so its row is skipped too.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{FIELD_COUNT, RawRow, ResultMatrix};

/// Parse a single line, returning `None` if it is not a result row.
pub fn parse_line(line: &str) -> Option<RawRow> {
    let mut fields = [0u64; FIELD_COUNT];
    let mut count = 0;

    for token in line.split_whitespace() {
        if count == FIELD_COUNT {
            return None;
        }
        let value: i64 = token.parse().ok()?;
        fields[count] = u64::try_from(value).ok()?;
        count += 1;
    }

    (count == FIELD_COUNT).then(|| RawRow::from_fields(fields))
}

/// Parse every result row in `text`, preserving source order.
pub fn parse_str(text: &str) -> ResultMatrix {
    text.lines().filter_map(parse_line).collect()
}

/// Parse every result row from a buffered reader.
pub fn parse_reader(reader: impl BufRead) -> std::io::Result<ResultMatrix> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        if let Some(row) = parse_line(&line?) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Read and parse an IOzone output file.
pub fn parse_file(path: &Path) -> Result<ResultMatrix> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening results file {}", path.display()))?;
    parse_reader(std::io::BufReader::new(file))
        .with_context(|| format!("reading results file {}", path.display()))
}

/// Yield the original text of every result row in `text`.
pub fn conforming_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|line| parse_line(line).is_some())
}
