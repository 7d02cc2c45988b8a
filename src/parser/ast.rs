// Parsed form of a template placeholder directive

use crate::palette::Rgb;
use serde::Serialize;

/// Statistic requested by a text or graph directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Count,
    Percentage,
    Mean,
    Range,
    /// Look up a single value of one column
    RawValue,
}

impl StatKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Count => "count",
            StatKind::Percentage => "percentage",
            StatKind::Mean => "mean",
            StatKind::Range => "range",
            StatKind::RawValue => "value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Bar,
    Pie,
}

/// Chart substitution
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDirective {
    pub kind: GraphKind,
    pub stat: StatKind,
    /// Column names or spreadsheet labels, in the order written
    pub column_refs: Vec<String>,
    /// Axis label font size; 0 lets the renderer fit it
    pub font_size: u32,
    pub title: String,
    pub raw_input: String,
}

/// Plain text substitution
#[derive(Debug, Clone, PartialEq)]
pub struct TextDirective {
    pub stat: StatKind,
    pub column_refs: Vec<String>,
    pub raw_input: String,
}

/// One placeholder command
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Graph(GraphDirective),
    Text(TextDirective),
    /// Replaces the active palette for every later graph
    PaletteDeclaration(Vec<Rgb>),
    /// Sets the display precedence of category names for every later graph
    OrderDeclaration(Vec<String>),
    Invalid { reason: String, raw_input: String },
}
