use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use surveygraph::aggregate::aggregate_columns;
use surveygraph::csv_reader::read_csv_file;
use surveygraph::graph::{PngRenderer, SeriesDump};
use surveygraph::template::TemplateDocument;
use surveygraph::{run_pass, RenderOptions};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "surveygraph")]
#[command(about = "Fill a report template with statistics and charts from a survey CSV export", long_about = None)]
struct Args {
    /// Survey export whose first two rows are header rows
    csv: PathBuf,

    /// Template text containing {{{ ... }}} directives
    template: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with render options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for rendered chart images
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Abort on the first directive that fails
    #[arg(long)]
    strict: bool,

    /// Print assembled chart series as JSON on stderr instead of drawing them
    #[arg(long)]
    dump_series: bool,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => RenderOptions::from_json_file(path)?,
        None => RenderOptions::default(),
    };
    if let Some(dir) = args.image_dir {
        options.image_dir = dir;
    }
    if args.strict {
        options.strict = true;
    }

    let table = read_csv_file(&args.csv)?;
    let columns = aggregate_columns(&table);
    info!(
        columns = columns.len(),
        rows = table.row_count(),
        "survey data loaded"
    );

    let mut document = TemplateDocument::from_file(&args.template)?;
    let palette = options.initial_palette();

    let report = if args.dump_series {
        let mut dump = SeriesDump::new(io::stderr());
        run_pass(&columns, &mut document, &mut dump, palette, options.strict)
    } else {
        let mut renderer = PngRenderer::new(options.image_dir.clone());
        if let Some((width, height)) = options.chart_size() {
            renderer = renderer.with_size(width, height);
        }
        run_pass(&columns, &mut document, &mut renderer, palette, options.strict)
    }
    .context("Document pass aborted")?;

    if !report.failures.is_empty() {
        warn!(
            failed = report.failures.len(),
            "some directives were left in place"
        );
    }

    let text = document.into_text();
    match &args.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write output '{}'", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write document to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
