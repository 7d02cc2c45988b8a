use crate::error::ReportWarning;
use crate::palette::Rgb;
use crate::parser::ast::{GraphKind, StatKind};
use serde::Serialize;

// =============================================================================
// Chart series: the contract with the chart renderer
// =============================================================================

/// One (category, value, colour) entry of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
    pub color: Option<Rgb>,
}

/// Named sequence of points destined for the renderer.
///
/// Invisible series are zero-valued spacers that only reserve room between
/// bar groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
    pub chart_type: GraphKind,
    pub visible: bool,
}

impl Series {
    pub fn new(name: impl Into<String>, chart_type: GraphKind) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
            chart_type,
            visible: true,
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.points.push(SeriesPoint {
            label: label.into(),
            value,
            color: None,
        });
    }

    pub fn set_color(&mut self, color: Rgb) {
        for point in &mut self.points {
            point.color = Some(color);
        }
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

// =============================================================================
// Chart layout hints
// =============================================================================

/// Presentation hints derived from the chart shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    /// Upper bound of the value axis; `None` lets the renderer pick
    pub value_axis_max: Option<f64>,
    pub show_legend: bool,
    /// Category label font size; 0 means auto-fit
    pub font_size: u32,
}

impl ChartLayout {
    pub fn for_chart(kind: GraphKind, stat: StatKind, column_count: usize, font_size: u32) -> Self {
        let (width, height) = match kind {
            GraphKind::Pie => (720, 560),
            GraphKind::Bar if column_count > 1 => (1200, 600),
            GraphKind::Bar => (1000, 400),
        };
        Self {
            width,
            height,
            value_axis_max: (stat == StatKind::Percentage).then_some(100.0),
            show_legend: kind == GraphKind::Pie || column_count > 1,
            font_size,
        }
    }
}

/// Everything the host needs to draw one graph directive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOutput {
    pub title: String,
    pub kind: GraphKind,
    pub stat: StatKind,
    /// Category slots along the category axis, in display order
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub layout: ChartLayout,
    pub warnings: Vec<ReportWarning>,
}

impl ChartOutput {
    pub fn visible_series(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(|s| s.visible)
    }
}

/// Result of processing one directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveOutput {
    Text(String),
    Chart(ChartOutput),
    /// A palette or order declaration updated the pipeline context
    Declaration,
}

/// Value label as shown on a chart: percentages always carry one decimal
pub fn format_value(stat: StatKind, value: f64) -> String {
    match stat {
        StatKind::Percentage => format!("{:.1}", value),
        _ => format!("{}", value),
    }
}
