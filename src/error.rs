use thiserror::Error;

/// Failures raised while importing data or processing a single directive.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    /// Missing CSV header rows, or a directive missing required fields.
    #[error("format error: {0}")]
    Format(String),

    /// A directive referenced columns but none of them exist.
    #[error("no columns found for directive '{directive}'")]
    Resolution { directive: String },

    /// Range or mean requested over categories that are not number words.
    #[error("cannot compute {stat} for '{directive}': no category converts to a number")]
    Conversion { stat: &'static str, directive: String },

    /// Value lookup on a column that has no observed values.
    #[error("column '{column}' has no values")]
    EmptyColumn { column: String },

    /// The directive is well formed but cannot be drawn as requested.
    #[error("invalid chart request: {0}")]
    Schema(String),

    /// Chart or document collaborator failure.
    #[error("render error: {0}")]
    Render(String),
}

impl ReportError {
    pub fn render(err: anyhow::Error) -> Self {
        ReportError::Render(format!("{:#}", err))
    }
}

/// Non-fatal conditions surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum ReportWarning {
    /// Fewer palette colours than series/points; colours were reused cyclically.
    PaletteInsufficient { needed: usize, available: usize },
}

impl std::fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWarning::PaletteInsufficient { needed, available } => write!(
                f,
                "not enough colors in palette ({} available, {} needed); colors will repeat",
                available, needed
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
