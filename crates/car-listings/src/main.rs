//! CLI entry point for the used-car listings explorer.

use anyhow::{Result, anyhow};
use car_listings::{Dashboard, DashboardSelection, Pipeline, PipelineConfig, PipelineResult};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Used-car listings explorer",
    long_about = "Cleans a used-car listings CSV and prints a text dashboard.\n\n\
                  EXAMPLES:\n  \
                  # Dashboard with the default selection\n  \
                  car-listings vehicles_us.csv\n\n  \
                  # Compare pickups with trucks using raw counts\n  \
                  car-listings vehicles_us.csv --compare pickup truck --no-normalize\n\n  \
                  # Machine-readable output\n  \
                  car-listings vehicles_us.csv --json | jq .dashboard.classification"
)]
struct Args {
    /// Path to the listings CSV file
    input: String,

    /// Vehicle type for the classification chart
    ///
    /// Defaults to the first type in the file
    #[arg(long = "type")]
    vehicle_type: Option<String>,

    /// Make for the days-listed histogram
    ///
    /// Defaults to the first make in the file
    #[arg(long)]
    make: Option<String>,

    /// The two vehicle types compared in the price histogram
    #[arg(long, num_args = 2, value_names = ["TYPE_A", "TYPE_B"])]
    compare: Option<Vec<String>>,

    /// Show raw counts in the price histogram instead of percentages
    #[arg(long)]
    no_normalize: bool,

    /// Number of price histogram bins
    #[arg(long, default_value = "25")]
    bins: usize,

    /// Number of days-listed histogram bins
    #[arg(long, default_value = "30")]
    days_bins: usize,

    /// Rows shown in the data table
    #[arg(long, default_value = "20")]
    rows: usize,

    /// Date format of the `date_posted` column
    #[arg(long, default_value = "%Y-%m-%d")]
    date_format: String,

    /// Output JSON to stdout instead of the text dashboard
    ///
    /// Disables all logs; only the final JSON document is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the dashboard)
    #[arg(short, long)]
    quiet: bool,
}

/// Everything printed under `--json`.
#[derive(Serialize)]
struct JsonOutput<'a> {
    processing_steps: &'a [String],
    summary: &'a car_listings::ProcessingSummary,
    dashboard: &'a Dashboard,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// only carries the JSON document.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = PipelineConfig::builder()
        .date_format(&args.date_format)
        .price_bins(args.bins)
        .days_listed_bins(args.days_bins)
        .table_preview_rows(args.rows)
        .build()?;

    let pipeline = build_pipeline(&args, config.clone())?;

    info!("{}", "=".repeat(80));
    info!("Processing listings from {}", args.input);
    info!("{}", "=".repeat(80));

    let result = pipeline.run_path(&args.input).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let selection = build_selection(&args, &result)?;
    let dashboard = Dashboard::build(&result.listings, &selection, &config).map_err(|e| {
        error!("Invalid selection: {}", e);
        anyhow!("Invalid selection: {}", e)
    })?;

    if args.json {
        let output = JsonOutput {
            processing_steps: &result.processing_steps,
            summary: &result.summary,
            dashboard: &dashboard,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_processing_summary(&result);
    println!("{dashboard}");

    Ok(())
}

/// Build the pipeline, logging progress unless `--quiet` is set.
fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Start from the default selection and apply the CLI overrides.
fn build_selection(args: &Args, result: &PipelineResult) -> Result<DashboardSelection> {
    let mut selection = DashboardSelection::defaults_for(&result.listings)?;

    if let Some(vehicle_type) = &args.vehicle_type {
        selection.vehicle_type = vehicle_type.clone();
    }
    if let Some(make) = &args.make {
        selection.make = make.clone();
    }
    if let Some([type_a, type_b]) = args.compare.as_deref() {
        selection.compare = (type_a.clone(), type_b.clone());
    }
    selection.normalize = !args.no_normalize;

    Ok(selection)
}

/// Print the processing steps ahead of the dashboard.
///
/// Uses `println!` rather than logging: this is the command's output and
/// stays visible under `--quiet`.
fn print_processing_summary(result: &PipelineResult) {
    println!("\n{}", "=".repeat(80));
    println!("PROCESSING SUMMARY");
    println!("{}\n", "=".repeat(80));

    println!("  Listings: {}", result.summary.rows);
    println!("  Values imputed: {}", result.summary.total_filled());
    println!("  Duration: {}ms", result.summary.duration_ms);
    println!();

    println!("STEPS");
    println!("{}", "-".repeat(40));
    for (idx, step) in result.processing_steps.iter().enumerate() {
        println!("  {}. {}", idx + 1, step);
    }
    println!();

    if !result.summary.warnings.is_empty() {
        println!("WARNINGS");
        println!("{}", "-".repeat(40));
        for warning in &result.summary.warnings {
            println!("  - {}", warning);
        }
        println!();
    }
}
