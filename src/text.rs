// Text substitution for non-graph directives

use crate::aggregate::Column;
use crate::error::{ReportError, Result};
use crate::parser::ast::{StatKind, TextDirective};

const NUMBER_WORDS: [&str; 21] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

/// Convert an English number word ("zero" through "twenty") to its value.
pub fn word_to_number(word: &str) -> Option<u32> {
    let lowered = word.to_lowercase();
    NUMBER_WORDS
        .iter()
        .position(|w| *w == lowered)
        .map(|n| n as u32)
}

/// Produce the replacement text for a text directive over its used columns.
pub fn render_text(columns: &[Column], directive: &TextDirective) -> Result<String> {
    match directive.stat {
        StatKind::RawValue => raw_value(columns, &directive.raw_input),
        StatKind::Count => Ok(count_text(columns)),
        StatKind::Percentage => Ok(percentage_text(columns)),
        StatKind::Range => range_text(columns, &directive.raw_input),
        StatKind::Mean => mean_text(columns, &directive.raw_input),
    }
}

fn raw_value(columns: &[Column], directive: &str) -> Result<String> {
    let column = columns.first().ok_or_else(|| ReportError::Resolution {
        directive: directive.to_string(),
    })?;
    column
        .categories
        .first()
        .map(|c| c.name.clone())
        .ok_or_else(|| ReportError::EmptyColumn {
            column: column.name.clone(),
        })
}

fn count_text(columns: &[Column]) -> String {
    let mut text = String::new();
    for column in columns {
        if column.categories.len() > 1 {
            for category in &column.categories {
                text.push_str(&format!("{}: {}, ", category.name, category.count));
            }
        } else {
            for category in &column.categories {
                text.push_str(&category.count.to_string());
            }
        }
        if column.unknown_count != 0 {
            text.push_str(&format!("Unknown: {}", column.unknown_count));
        }
    }
    text
}

/// Share of each answer over all rows of its column, unknowns included.
fn percentage_text(columns: &[Column]) -> String {
    let mut parts = Vec::new();
    for column in columns {
        let share = |count: usize| {
            if column.total_count == 0 {
                0.0
            } else {
                round_to(count as f64 / column.total_count as f64 * 100.0, 1)
            }
        };
        for category in &column.categories {
            parts.push(format!("{}: {:.1}%", category.name, share(category.count)));
        }
        if column.unknown_count != 0 {
            parts.push(format!("Unknown: {:.1}%", share(column.unknown_count)));
        }
    }
    parts.join(", ")
}

fn numeric_categories(columns: &[Column]) -> impl Iterator<Item = (Option<u32>, usize)> + '_ {
    columns
        .iter()
        .flat_map(|c| c.categories.iter())
        .map(|c| (word_to_number(&c.name), c.count))
}

fn range_text(columns: &[Column], directive: &str) -> Result<String> {
    let mut values = numeric_categories(columns).filter_map(|(value, _)| value);
    let first = values.next().ok_or_else(|| ReportError::Conversion {
        stat: StatKind::Range.name(),
        directive: directive.to_string(),
    })?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Ok(format!("{} - {}", min, max))
}

/// Weighted mean of the number-word categories.
///
/// Categories that are not number words still add their count to the
/// denominator.
fn mean_text(columns: &[Column], directive: &str) -> Result<String> {
    let mut weighted_sum: u64 = 0;
    let mut occurrences: u64 = 0;
    let mut converted_any = false;

    for (value, count) in numeric_categories(columns) {
        if let Some(v) = value {
            weighted_sum += v as u64 * count as u64;
            converted_any = true;
        }
        occurrences += count as u64;
    }

    if !converted_any || occurrences == 0 {
        return Err(ReportError::Conversion {
            stat: StatKind::Mean.name(),
            directive: directive.to_string(),
        });
    }

    let mean = weighted_sum as f64 / occurrences as f64;
    Ok(format!("{}", round_to(mean, 2)))
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
