// Runtime executor for template directives

use crate::aggregate::Column;
use crate::error::{ReportError, ReportWarning, Result};
use crate::ir::{ChartOutput, DirectiveOutput};
use crate::palette::ColorPalette;
use crate::parser::ast::Directive;
use crate::parser::lexer::strip_markers;
use crate::parser::parse_directive;
use crate::resolve::{normalize_columns, resolve_columns};
use crate::text::render_text;
use crate::transform::assemble_series;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// State carried from one directive to the next within a single document pass.
///
/// Only palette and order declarations change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineContext {
    palette: ColorPalette,
    order: Vec<String>,
}

impl PipelineContext {
    pub fn new(palette: ColorPalette) -> Self {
        Self {
            palette,
            order: Vec::new(),
        }
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Active category order; empty when unset
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn set_palette(&mut self, palette: ColorPalette) {
        self.palette = palette;
    }

    pub fn set_order(&mut self, order: Vec<String>) {
        self.order = order;
    }

    /// Apply a declaration. Returns false for directives that are not declarations.
    pub fn apply(&mut self, directive: &Directive) -> bool {
        match directive {
            Directive::PaletteDeclaration(colors) => {
                if let Some(palette) = ColorPalette::new(colors.clone()) {
                    debug!(colors = palette.len(), "palette replaced");
                    self.palette = palette;
                }
                true
            }
            Directive::OrderDeclaration(order) => {
                debug!(entries = order.len(), "order replaced");
                self.order = order.clone();
                true
            }
            _ => false,
        }
    }
}

/// Parse and evaluate one raw directive against the aggregated columns.
///
/// `raw` may still carry its `{{{ }}}` markers.
pub fn process_directive(
    raw: &str,
    columns: &[Column],
    context: &mut PipelineContext,
) -> Result<DirectiveOutput> {
    let directive = parse_directive(strip_markers(raw));

    match directive {
        Directive::Invalid { reason, raw_input } => Err(ReportError::Format(format!(
            "{} in '{}'",
            reason, raw_input
        ))),
        Directive::PaletteDeclaration(_) | Directive::OrderDeclaration(_) => {
            context.apply(&directive);
            Ok(DirectiveOutput::Declaration)
        }
        Directive::Text(text) => {
            let used = resolve_columns(columns, &text.column_refs, &text.raw_input)?;
            let normalized = normalize_columns(used);
            render_text(&normalized.columns, &text).map(DirectiveOutput::Text)
        }
        Directive::Graph(graph) => {
            let used = resolve_columns(columns, &graph.column_refs, &graph.raw_input)?;
            let normalized = normalize_columns(used);
            assemble_series(&normalized, &graph, context).map(DirectiveOutput::Chart)
        }
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Supplies raw directive strings in document order
pub trait DirectiveSource {
    /// `None` once the document holds no further directive.
    fn next_directive(&mut self) -> anyhow::Result<Option<String>>;
}

/// Receives results for the directive most recently returned by the source
pub trait DocumentSink {
    fn replace_text(&mut self, text: &str) -> anyhow::Result<()>;
    fn replace_with_image(&mut self, image: &std::path::Path, title: &str) -> anyhow::Result<()>;
}

/// Turns assembled series into an image file
pub trait ChartRenderer {
    fn render(&mut self, chart: &ChartOutput) -> anyhow::Result<PathBuf>;
}

/// A directive that failed without aborting the pass
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveFailure {
    pub directive: String,
    pub error: ReportError,
}

/// Summary of one document pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub text_replaced: usize,
    pub charts_rendered: usize,
    pub declarations: usize,
    pub failures: Vec<DirectiveFailure>,
    pub warnings: Vec<ReportWarning>,
}

impl PassReport {
    pub fn processed(&self) -> usize {
        self.text_replaced + self.charts_rendered + self.declarations + self.failures.len()
    }
}

/// Drive one document pass: every directive in order, one fresh context.
///
/// Directive failures are recorded and the marker is left untouched. With
/// `strict` set the first failure aborts the pass instead. Collaborator
/// failures always abort.
pub fn run_pass<D, R>(
    columns: &[Column],
    document: &mut D,
    renderer: &mut R,
    palette: ColorPalette,
    strict: bool,
) -> Result<PassReport>
where
    D: DirectiveSource + DocumentSink,
    R: ChartRenderer,
{
    let mut context = PipelineContext::new(palette);
    let mut report = PassReport::default();

    while let Some(raw) = document.next_directive().map_err(ReportError::render)? {
        info!(directive = %raw, "processing directive");

        let output = match process_directive(&raw, columns, &mut context) {
            Ok(output) => output,
            Err(error) => {
                if strict {
                    return Err(error);
                }
                warn!(directive = %raw, error = %error, "directive skipped");
                report.failures.push(DirectiveFailure {
                    directive: raw,
                    error,
                });
                continue;
            }
        };

        match output {
            DirectiveOutput::Text(text) => {
                document.replace_text(&text).map_err(ReportError::render)?;
                report.text_replaced += 1;
            }
            DirectiveOutput::Declaration => {
                document.replace_text("").map_err(ReportError::render)?;
                report.declarations += 1;
            }
            DirectiveOutput::Chart(chart) => {
                for warning in &chart.warnings {
                    warn!(title = %chart.title, "{}", warning);
                }
                let path = renderer.render(&chart).map_err(ReportError::render)?;
                document
                    .replace_with_image(&path, &chart.title)
                    .map_err(ReportError::render)?;
                report.warnings.extend(chart.warnings);
                report.charts_rendered += 1;
            }
        }
    }

    info!(
        text = report.text_replaced,
        charts = report.charts_rendered,
        declarations = report.declarations,
        failures = report.failures.len(),
        "document pass complete"
    );
    Ok(report)
}
