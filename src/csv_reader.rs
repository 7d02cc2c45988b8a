// CSV importer for two-row-header survey exports

use crate::data::RawTable;
use crate::error::{ReportError, Result};
use anyhow::Context;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, warn};

/// Placeholder cells that survey exports put in the second header row and in
/// data rows. They never name a column and never count as an answer.
pub const DUMMY_TOKENS: [&str; 2] = ["Response", "Open-Ended Response"];

const DUPLICATE_SUFFIX: &str = "copy";

fn is_dummy(cell: &str) -> bool {
    DUMMY_TOKENS.contains(&cell)
}

/// Parse raw CSV text into a [`RawTable`].
///
/// The first two lines are both candidate header rows. For each column the
/// second row's cell wins unless it is blank or a dummy token, in which case
/// the first row's cell is used. Columns where both candidates are blank carry
/// no header and are dropped together with their data.
///
/// Quoted fields may contain commas and line breaks; the quoted text is stored
/// as one cell. A blank line between data rows is a row of empty cells.
pub fn import_csv(text: &str) -> Result<RawTable> {
    let mut records = logical_records(text).into_iter();

    let first = parse_record(next_header_line(&mut records, "first")?, "first header row")?;
    let second = parse_record(next_header_line(&mut records, "second")?, "second header row")?;

    let columns = resolve_headers(&first, &second);
    let headers = disambiguate(columns.iter().map(|(_, name)| name.clone()).collect());

    let mut lines: Vec<&str> = records.collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let mut rows = Vec::with_capacity(lines.len());
    for (number, line) in lines.into_iter().enumerate() {
        let record = parse_record(line, &format!("data row {}", number + 1))?;
        let row = columns
            .iter()
            .map(|(source, _)| match record.get(*source) {
                Some(cell) if !is_dummy(cell) => cell.to_string(),
                _ => String::new(),
            })
            .collect();
        rows.push(row);
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        "imported CSV table"
    );

    Ok(RawTable::new(headers, rows))
}

/// Read a CSV file from disk and import it.
pub fn read_csv_file(path: &Path) -> anyhow::Result<RawTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file '{}'", path.display()))?;
    import_csv(&text).with_context(|| format!("Failed to import '{}'", path.display()))
}

fn next_header_line<'a, I>(records: &mut I, which: &str) -> Result<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    records
        .next()
        .ok_or_else(|| ReportError::Format(format!("missing {} header row", which)))
}

/// Split text into physical lines, joining lines while a quoted field is open.
///
/// Line terminators are stripped. Blank lines are kept as empty records.
fn logical_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut open_quote = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        offset += line.len();
        if line.bytes().filter(|b| *b == b'"').count() % 2 == 1 {
            open_quote = !open_quote;
        }
        if !open_quote {
            records.push(text[start..offset].trim_end_matches(&['\r', '\n'][..]));
            start = offset;
        }
    }
    if start < text.len() {
        records.push(text[start..].trim_end_matches(&['\r', '\n'][..]));
    }
    records
}

/// Tokenise one logical record; a blank record yields no cells.
fn parse_record(line: &str, what: &str) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    reader
        .read_record(&mut record)
        .map_err(|e| ReportError::Format(format!("failed to parse CSV {}: {}", what, e)))?;
    Ok(record)
}

/// Pick one header per source column; returns (source index, header).
fn resolve_headers(first: &StringRecord, second: &StringRecord) -> Vec<(usize, String)> {
    let width = first.len().max(second.len());
    let mut resolved = Vec::with_capacity(width);

    for index in 0..width {
        let primary = second.get(index).map(str::trim).unwrap_or("");
        let fallback = first.get(index).map(str::trim).unwrap_or("");

        if !primary.is_empty() && !is_dummy(primary) {
            resolved.push((index, primary.to_string()));
        } else if !fallback.is_empty() {
            resolved.push((index, fallback.to_string()));
        } else {
            debug!(column = index, "dropping column without a header");
        }
    }

    resolved
}

fn disambiguate(headers: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header;
        if unique.contains(&name) {
            warn!(header = %name, "multiple identical column names in CSV input");
            while unique.contains(&name) {
                name.push_str(DUPLICATE_SUFFIX);
            }
        }
        unique.push(name);
    }
    unique
}
