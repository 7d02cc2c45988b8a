use crate::aggregate::{CategoryCount, Column};
use crate::error::{ReportError, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Private copies of the columns a directive uses, aligned for comparison
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumns {
    pub columns: Vec<Column>,
    /// Index of the column whose category sequence the others were aligned to
    pub reference: usize,
}

impl NormalizedColumns {
    pub fn reference_column(&self) -> &Column {
        &self.columns[self.reference]
    }
}

/// Find the column a single reference names.
///
/// Exact name match wins, then a case-insensitive name match, then the
/// spreadsheet label ("A", "AB", ...).
pub fn find_column<'a>(columns: &'a [Column], reference: &str) -> Option<&'a Column> {
    let lowered = reference.to_lowercase();
    columns
        .iter()
        .find(|c| c.name == reference)
        .or_else(|| columns.iter().find(|c| c.name.to_lowercase() == lowered))
        .or_else(|| {
            columns
                .iter()
                .find(|c| c.abbreviated_label.eq_ignore_ascii_case(reference))
        })
}

/// Copy the referenced columns in the order the directive lists them.
///
/// Unknown references are skipped; resolving nothing at all is an error.
pub fn resolve_columns(
    columns: &[Column],
    references: &[String],
    directive: &str,
) -> Result<Vec<Column>> {
    let mut used = Vec::with_capacity(references.len());
    for reference in references {
        match find_column(columns, reference) {
            Some(column) => used.push(column.clone()),
            None => warn!(reference = %reference, directive, "column reference not found"),
        }
    }

    if used.is_empty() {
        return Err(ReportError::Resolution {
            directive: directive.to_string(),
        });
    }
    Ok(used)
}

/// Align category sets so every column can be plotted against the others.
///
/// The column with the most categories (first on ties) is the reference. Every
/// other column is rebuilt to start with the reference's category sequence,
/// using a zero count for any category it never saw.
pub fn normalize_columns(mut columns: Vec<Column>) -> NormalizedColumns {
    let reference = columns
        .iter()
        .enumerate()
        .fold(0, |best, (i, c)| {
            if c.categories.len() > columns[best].categories.len() {
                i
            } else {
                best
            }
        });

    if columns.len() > 1 {
        let template: Vec<String> = columns[reference]
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect();

        for (index, column) in columns.iter_mut().enumerate() {
            if index != reference {
                align_to(column, &template);
            }
        }
    }

    NormalizedColumns { columns, reference }
}

/// Rebuild a column's categories in reference order, zero-filling gaps.
///
/// Categories the reference lacks keep their relative order after the aligned
/// prefix, so no counts are lost.
fn align_to(column: &mut Column, template: &[String]) {
    let position: HashMap<&str, usize> = template
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut aligned: Vec<CategoryCount> = template
        .iter()
        .map(|name| CategoryCount::new(name.clone(), 0))
        .collect();
    let mut extra = Vec::new();

    for category in std::mem::take(&mut column.categories) {
        match position.get(category.name.as_str()) {
            Some(&i) => aligned[i].count = category.count,
            None => extra.push(category),
        }
    }

    if !extra.is_empty() {
        debug!(
            column = %column.name,
            extra = extra.len(),
            "column has categories the reference column lacks"
        );
    }
    aligned.extend(extra);
    column.categories = aligned;
}
