use crate::ir::{format_value, ChartOutput, Series};
use crate::palette::Rgb;
use crate::parser::ast::GraphKind;
use crate::runtime::ChartRenderer;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::element::Pie;
use plotters::prelude::*;
use std::io::Write;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, info};

const FONT: &str = "sans-serif";

/// In-memory RGB canvas for one chart
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    title: String,
}

impl Canvas {
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot create a {}x{} canvas", width, height);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .with_context(|| format!("Canvas size {}x{} is too large", width, height))?;
        Ok(Canvas {
            buffer: vec![0u8; len],
            width,
            height,
            title: title.into(),
        })
    }

    /// Dodged bars, one slot per series within each category.
    ///
    /// Invisible series keep their slot but draw nothing.
    pub fn draw_bars(&mut self, chart: &ChartOutput) -> Result<()> {
        if chart.categories.is_empty() || chart.series.is_empty() {
            anyhow::bail!("Cannot create bar chart with no data");
        }

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let num_categories = chart.categories.len();
        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(10)
            .caption(&self.title, (FONT, 20))
            .x_label_area_size(40)
            .y_label_area_size(50);
        let mut plot = builder
            .build_cartesian_2d(0.0..(num_categories as f64), value_range(chart))
            .context("Failed to build chart")?;

        let categories = &chart.categories;
        let formatter = |x: &f64| {
            let idx = x.floor() as usize;
            categories.get(idx).cloned().unwrap_or_default()
        };
        {
            let mut mesh = plot.configure_mesh();
            mesh.x_labels(num_categories)
                .x_label_formatter(&formatter)
                .disable_x_mesh();
            if chart.layout.font_size > 0 {
                mesh.x_label_style((FONT, chart.layout.font_size));
            }
            mesh.draw().context("Failed to draw mesh")?;
        }

        let slots = slot_offsets(chart.series.len());
        let bar_width = slot_width(chart.series.len());

        for (series, offset) in chart.series.iter().zip(slots) {
            if !series.visible {
                continue;
            }
            let bars = series.points.iter().enumerate().map(|(cat_idx, point)| {
                let x_center = cat_idx as f64 + 0.5 + offset;
                Rectangle::new(
                    [
                        (x_center - bar_width / 2.0, 0.0),
                        (x_center + bar_width / 2.0, point.value),
                    ],
                    point_color(point.color).filled(),
                )
            });
            let anno = plot.draw_series(bars).context("Failed to draw bars")?;
            if chart.layout.show_legend {
                let color = legend_color(series);
                anno.label(series.name.clone()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            }

            let labels = series.points.iter().enumerate().map(|(cat_idx, point)| {
                Text::new(
                    format_value(chart.stat, point.value),
                    (cat_idx as f64 + 0.5 + offset - bar_width / 2.0, point.value),
                    (FONT, 12),
                )
            });
            plot.draw_series(labels).context("Failed to draw value labels")?;
        }

        if chart.layout.show_legend {
            plot.configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .context("Failed to draw legend")?;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// One slice per point of the single series, largest first
    pub fn draw_pie(&mut self, chart: &ChartOutput) -> Result<()> {
        let series = chart
            .series
            .first()
            .context("Cannot create pie chart with no series")?;
        let sizes: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        if sizes.iter().sum::<f64>() <= 0.0 {
            anyhow::bail!("Cannot create pie chart with no values");
        }
        let colors: Vec<RGBColor> = series.points.iter().map(|p| point_color(p.color)).collect();
        let labels: Vec<String> = series
            .points
            .iter()
            .map(|p| format!("{} ({})", p.label, format_value(chart.stat, p.value)))
            .collect();

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;
        let area = root
            .titled(&self.title, (FONT, 20))
            .context("Failed to draw title")?;

        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = f64::from(w.min(h)) * 0.35;
        let label_size = if chart.layout.font_size > 0 {
            chart.layout.font_size
        } else {
            14
        };

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style((FONT, label_size).into_font().color(&BLACK));
        area.draw(&pie).context("Failed to draw pie")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Value axis from zero to the layout cap, or a little above the tallest bar
fn value_range(chart: &ChartOutput) -> Range<f64> {
    let top = match chart.layout.value_axis_max {
        Some(max) => max,
        None => {
            let tallest = chart.visible_series().map(Series::max_value).fold(0.0, f64::max);
            (tallest * 1.1).max(1.0)
        }
    };
    0.0..top
}

/// Width of one bar as a fraction of a category slot.
///
/// Grouped charts carry filler series for their spacing, so the slot is
/// shared out completely.
fn slot_width(series_count: usize) -> f64 {
    if series_count <= 1 {
        0.8
    } else {
        1.0 / series_count as f64
    }
}

/// Offset of each series' bar centre from the middle of its category slot
fn slot_offsets(series_count: usize) -> Vec<f64> {
    let width = slot_width(series_count);
    let middle = (series_count as f64 - 1.0) / 2.0;
    (0..series_count)
        .map(|i| (i as f64 - middle) * width)
        .collect()
}

fn point_color(color: Option<Rgb>) -> RGBColor {
    match color {
        Some(Rgb(r, g, b)) => RGBColor(r, g, b),
        None => BLUE,
    }
}

fn legend_color(series: &Series) -> RGBColor {
    point_color(series.points.first().and_then(|p| p.color))
}

/// Writes each chart as `chart_NNN.png` into one directory
pub struct PngRenderer {
    image_dir: PathBuf,
    size: Option<(u32, u32)>,
    counter: usize,
}

impl PngRenderer {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            size: None,
            counter: 0,
        }
    }

    /// Fixed output size instead of the per-chart layout hint
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

impl ChartRenderer for PngRenderer {
    fn render(&mut self, chart: &ChartOutput) -> Result<PathBuf> {
        let (width, height) = self
            .size
            .unwrap_or((chart.layout.width, chart.layout.height));

        let mut canvas = Canvas::new(width, height, chart.title.clone())?;
        match chart.kind {
            GraphKind::Bar => canvas.draw_bars(chart)?,
            GraphKind::Pie => canvas.draw_pie(chart)?,
        }
        let png_bytes = canvas.render()?;

        std::fs::create_dir_all(&self.image_dir).with_context(|| {
            format!("Failed to create image directory '{}'", self.image_dir.display())
        })?;
        self.counter += 1;
        let path = self.image_dir.join(format!("chart_{:03}.png", self.counter));
        std::fs::write(&path, png_bytes)
            .with_context(|| format!("Failed to write chart '{}'", path.display()))?;

        info!(path = %path.display(), title = %chart.title, "chart rendered");
        Ok(path)
    }
}

/// Writes the assembled series as JSON instead of drawing them
pub struct SeriesDump<W: Write> {
    out: W,
    counter: usize,
}

impl<W: Write> SeriesDump<W> {
    pub fn new(out: W) -> Self {
        Self { out, counter: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for SeriesDump<W> {
    /// The returned path names the dump entry; no file is written.
    fn render(&mut self, chart: &ChartOutput) -> Result<PathBuf> {
        serde_json::to_writer_pretty(&mut self.out, chart).context("Failed to serialize series")?;
        writeln!(self.out).context("Failed to write series dump")?;
        self.counter += 1;
        debug!(title = %chart.title, "series dumped");
        Ok(PathBuf::from(format!("series_{:03}.json", self.counter)))
    }
}
