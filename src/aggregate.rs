// Frequency aggregation: one distribution per imported column

use crate::data::RawTable;
use std::collections::BTreeMap;
use tracing::debug;

/// A distinct answer observed in a column and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

impl CategoryCount {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Frequency distribution of one column.
///
/// Invariant: `unknown_count + sum(categories.count) == total_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Spreadsheet-style label of the column position ("A", "B", ..., "AA").
    pub abbreviated_label: String,
    pub categories: Vec<CategoryCount>,
    pub total_count: usize,
    /// Rows where this column's cell was empty.
    pub unknown_count: usize,
}

impl Column {
    pub fn category_total(&self) -> usize {
        self.categories.iter().map(|c| c.count).sum()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryCount> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Aggregate every column of the table, preserving header order.
pub fn aggregate_columns(table: &RawTable) -> Vec<Column> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| aggregate_column(table, index, header))
        .collect()
}

fn aggregate_column(table: &RawTable, index: usize, header: &str) -> Column {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut unknown_count = 0;
    let mut echoed_headers = 0;

    for cell in table.column_values(index) {
        if cell.is_empty() {
            unknown_count += 1;
        } else if cell == header {
            // Header text repeated inside the data block is not an answer.
            echoed_headers += 1;
        } else {
            *counts.entry(cell).or_insert(0) += 1;
        }
    }

    if echoed_headers > 0 {
        debug!(column = header, echoed_headers, "ignored cells repeating the header");
    }

    // BTreeMap iteration yields categories in lexicographic order.
    let categories: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount::new(name, count))
        .collect();

    let total_count = unknown_count + categories.iter().map(|c| c.count).sum::<usize>();

    Column {
        name: header.to_string(),
        abbreviated_label: abbreviated_label(index),
        categories,
        total_count,
        unknown_count,
    }
}

/// Base-26 spreadsheet label for a 0-based column position.
///
/// 0 -> "A", 25 -> "Z", 26 -> "AA", 701 -> "ZZ", 702 -> "AAA".
pub fn abbreviated_label(index: usize) -> String {
    let mut dividend = index + 1;
    let mut letters = Vec::new();
    while dividend > 0 {
        let modulo = (dividend - 1) % 26;
        letters.push(b'A' + modulo as u8);
        dividend = (dividend - modulo) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_abbreviated_labels() {
        assert_eq!(abbreviated_label(0), "A");
        assert_eq!(abbreviated_label(1), "B");
        assert_eq!(abbreviated_label(25), "Z");
        assert_eq!(abbreviated_label(26), "AA");
        assert_eq!(abbreviated_label(27), "AB");
        assert_eq!(abbreviated_label(701), "ZZ");
        assert_eq!(abbreviated_label(702), "AAA");
    }

    #[test]
    fn test_counts_sorted_by_name() {
        let t = table(
            &["Pet"],
            &[&["dog"], &["cat"], &["dog"], &[""], &["bird"]],
        );
        let columns = aggregate_columns(&t);
        assert_eq!(columns.len(), 1);
        let pet = &columns[0];
        assert_eq!(
            pet.categories,
            vec![
                CategoryCount::new("bird", 1),
                CategoryCount::new("cat", 1),
                CategoryCount::new("dog", 2),
            ]
        );
        assert_eq!(pet.unknown_count, 1);
        assert_eq!(pet.total_count, 5);
        assert_eq!(pet.abbreviated_label, "A");
    }

    #[test]
    fn test_header_echo_excluded() {
        let t = table(&["Q1"], &[&["Q1"], &["yes"], &["no"]]);
        let q1 = &aggregate_columns(&t)[0];
        assert!(q1.category("Q1").is_none());
        assert_eq!(q1.categories.len(), 2);
    }

    #[test]
    fn test_invariant_holds_for_every_column() {
        let t = table(
            &["A", "B", "C"],
            &[
                &["x", "", "C"],
                &["y", "1", "z"],
                &["", "", "z"],
                &["x", "2", ""],
            ],
        );
        for column in aggregate_columns(&t) {
            assert_eq!(
                column.unknown_count + column.category_total(),
                column.total_count,
                "invariant broken for {}",
                column.name
            );
        }
    }

    #[test]
    fn test_column_order_and_labels_follow_headers() {
        let t = table(&["first", "second"], &[&["a", "b"]]);
        let columns = aggregate_columns(&t);
        assert_eq!(columns[0].name, "first");
        assert_eq!(columns[1].name, "second");
        assert_eq!(columns[1].abbreviated_label, "B");
    }

    #[test]
    fn test_empty_table() {
        let t = table(&["Q"], &[]);
        let q = &aggregate_columns(&t)[0];
        assert!(q.categories.is_empty());
        assert_eq!(q.total_count, 0);
        assert_eq!(q.unknown_count, 0);
    }
}
