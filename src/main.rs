use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webpro_etl::config::Config;
use webpro_etl::consolidate::{discover_inputs, Consolidator};
use webpro_etl::output::{write_output, OutputShape};

#[derive(Parser)]
#[command(name = "webpro-etl")]
#[command(about = "Consolidate WEBPRO input workbooks into combined tables", long_about = None)]
struct Cli {
    /// Directory containing the input workbooks (env: WEBPRO_INPUT_DIR)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output workbook, or output directory for 'tables' (env: WEBPRO_OUTPUT)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Glob pattern for input files within the input directory (env: WEBPRO_PATTERN)
    #[arg(long)]
    pattern: Option<String>,

    /// Output shape: 'workbook' (one sheet per form), 'tables' (relational CSV), 'wide' (single sheet) (env: WEBPRO_SHAPE)
    #[arg(long, value_enum)]
    shape: Option<OutputShape>,

    /// JSON layout registry to use instead of the built-in one (env: WEBPRO_LAYOUTS)
    #[arg(long)]
    layouts: Option<PathBuf>,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Print the layout registry as JSON and exit
    #[arg(long)]
    dump_layouts: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,webpro_etl=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }
    if let Some(pattern) = cli.pattern {
        config.pattern = pattern;
    }
    if let Some(shape) = cli.shape {
        config.shape = shape;
    }
    if let Some(layouts) = cli.layouts {
        config.layouts = Some(layouts);
    }

    let registry = config.registry()?;
    if cli.dump_layouts {
        println!("{}", registry.to_json()?);
        return Ok(());
    }
    info!("Starting WEBPRO consolidation with config: {:?}", config);

    let started = Instant::now();
    let paths = discover_inputs(&config.input_dir, &config.pattern)?;
    info!("Input files: {}", paths.len());

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut consolidator = Consolidator::new(registry, config.shape);
    for path in &paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name);
        pb.suspend(|| {
            consolidator.add_path(path);
        });
        pb.inc(1);
    }
    pb.finish_and_clear();
    let result = consolidator.finish();
    result.ensure_readable()?;

    let output = config.output_path();
    info!("Writing {} output to {}", config.shape, output.display());
    let written = write_output(&result.tables, config.shape, &output)?;

    let summary = result.summary();
    info!("Summary:");
    for total in summary.totals.iter().filter(|t| t.records > 0) {
        info!("  {}: {} records", total.entity_type, total.records);
    }
    for total in summary.totals.iter().filter(|t| t.dropped.total() > 0) {
        warn!(
            "Dropped {} rows: {} orphan children, {} unmatched",
            total.entity_type, total.dropped.orphan_children, total.dropped.unmatched_rows
        );
    }
    for file in summary.files.iter().filter(|f| f.error.is_some()) {
        warn!(
            "[{}] {} failed: {}",
            file.file_id,
            file.path.display(),
            file.error.as_deref().unwrap_or_default()
        );
    }

    if let Some(path) = cli.summary_json {
        summary.write_json(&path)?;
        info!("Run summary written to {}", path.display());
    }

    info!(
        "Done: {} files ({} failed), {} output files in {:.2}s",
        summary.files_processed,
        summary.files_failed,
        written.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
