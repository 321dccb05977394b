use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use sim_compare::config::{self, RunConfig, DEFAULT_REFERENCE_YEAR};
use sim_compare::discovery;
use sim_compare::errors::PipelineError;
use sim_compare::measurements::{LaiCsv, MeasurementSource, TemperatureWorkbook};
use sim_compare::metric::Metric;
use sim_compare::metrics::METRICS;
use sim_compare::parallel::ExtractionRunner;
use sim_compare::plot;
use sim_compare::time_operation;

#[derive(Parser, Debug)]
#[command(name = "sim_compare")]
#[command(about = "Compare crop-model simulation output against measured field data", long_about = None)]
struct Args {
    /// Directory containing simulation output files
    #[arg(long, env = "WORKING_DIR")]
    working_dir: PathBuf,

    /// Which comparison to run
    #[arg(long, value_enum)]
    metric: Metric,

    /// LAI measurement CSV (required for the lai metric)
    #[arg(long)]
    lai_csv: Option<PathBuf>,

    /// Directory of exported canopy-temperature workbook sheets
    /// (required for the canopy-temp metric)
    #[arg(long)]
    workbook_dir: Option<PathBuf>,

    /// Calendar year combined with simulated day-of-year values
    #[arg(long)]
    reference_year: Option<i32>,

    /// Output SVG path (default target/plots/<metric>.svg)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Simulation file names to skip (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Optional JSON run config; command-line flags win on conflict
    #[arg(long)]
    run_config: Option<PathBuf>,

    /// Process files one at a time instead of fanning out
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let run_config = match &args.run_config {
        Some(path) => config::load_run_config(path)
            .with_context(|| format!("Failed to load run config {}", path.display()))?,
        None => RunConfig::default(),
    };

    let reference_year = args
        .reference_year
        .or(run_config.reference_year)
        .unwrap_or(DEFAULT_REFERENCE_YEAR);

    let mut exclude = args.exclude.clone();
    exclude.extend(run_config.exclude.iter().cloned());
    exclude.extend(
        args.metric
            .default_exclusions()
            .iter()
            .map(|s| s.to_string()),
    );

    println!("--- Simulated vs Measured Comparison ---");
    println!("Working Dir: {}", args.working_dir.display());
    println!("Metric: {}", args.metric.spec().name);
    println!("Reference Year: {}", reference_year);
    println!("Excluded Files: {}", exclude.len());

    let sim_files = time_operation!(
        "discovery",
        discovery::discover(&args.working_dir, &run_config.sim_suffix, &exclude)
    )?;
    if sim_files.is_empty() {
        return Err(PipelineError::Config(format!(
            "no simulation files matching '*{}' found in {}",
            run_config.sim_suffix,
            args.working_dir.display()
        ))
        .into());
    }

    let source: Box<dyn MeasurementSource> = match args.metric {
        Metric::Lai => {
            let path = args
                .lai_csv
                .as_deref()
                .context("--lai-csv is required for the lai metric")?;
            Box::new(time_operation!("measurement load", LaiCsv::load(path))?)
        }
        Metric::CanopyTemp => {
            let dir = args
                .workbook_dir
                .as_deref()
                .context("--workbook-dir is required for the canopy-temp metric")?;
            Box::new(TemperatureWorkbook::open(dir)?)
        }
    };
    info!("Measurement source: {}", source.name());

    let runner = if args.sequential {
        ExtractionRunner::sequential()
    } else {
        ExtractionRunner::new()
    };
    let panels = runner.run(&sim_files, source.as_ref(), args.metric, reference_year);

    let extracted = panels.iter().filter(|p| p.is_extracted()).count();
    if extracted == 0 {
        return Err(PipelineError::NoSeriesExtracted {
            dir: args.working_dir.clone(),
        }
        .into());
    }
    info!("Extracted {}/{} comparison series", extracted, panels.len());

    let out = args.out.clone().unwrap_or_else(|| {
        PathBuf::from(format!("target/plots/{}.svg", args.metric.spec().name))
    });
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    time_operation!("render", plot::render_grid(&panels, args.metric, &out))?;
    println!("Saved comparison figure to {}", out.display());

    METRICS.lock().print_summary();
    Ok(())
}
