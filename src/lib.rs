// Library exports for surveygraph

pub mod aggregate;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod parser;
pub mod resolve;
pub mod runtime;
pub mod template;
pub mod text;
pub mod transform;

pub use error::{ReportError, ReportWarning};
pub use ir::{ChartOutput, DirectiveOutput, Series, SeriesPoint};
pub use runtime::{process_directive, run_pass, PassReport, PipelineContext};

use anyhow::Context;
use palette::{ColorPalette, Rgb};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Overrides the per-chart layout width
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Initial palette for every pass, as `[r, g, b]` triples
    pub palette: Option<Vec<Rgb>>,
    pub image_dir: PathBuf,
    pub strict: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            palette: None,
            image_dir: PathBuf::from("charts"),
            strict: false,
        }
    }
}

impl RenderOptions {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))
    }

    /// Palette a pass starts with; an empty configured list keeps the default.
    pub fn initial_palette(&self) -> ColorPalette {
        self.palette
            .clone()
            .and_then(ColorPalette::new)
            .unwrap_or_default()
    }

    /// Fixed chart size when both dimensions are configured
    pub fn chart_size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}
