#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the accident map toolchain.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use accident_map_models::YearOutcome;
use accident_map_pipeline::{PipelineConfig, PipelineRun};
use clap::{Args, Parser, Subcommand};
use config::FileConfig;

#[derive(Parser)]
#[command(name = "accident_map_cli", about = "Leipzig accident data toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Shared input options, applied on top of an optional config file.
#[derive(Args)]
struct InputArgs {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the yearly `Unfallorte{year}_LinRef.csv` files
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Path to the district boundary GeoJSON file
    #[arg(long)]
    boundary_file: Option<PathBuf>,
    /// First year to process (inclusive)
    #[arg(long)]
    start_year: Option<i32>,
    /// Last year to process (inclusive)
    #[arg(long)]
    end_year: Option<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process all configured years and export CSV and GeoJSON files
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// Directory for exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Seasonal accident distribution for one city district
    Seasons {
        #[command(flatten)]
        input: InputArgs,
        /// District name, e.g. "Mitte"
        #[arg(long)]
        district: String,
    },
    /// Seasonal distribution by transport mode for one city district
    Modes {
        #[command(flatten)]
        input: InputArgs,
        /// District name, e.g. "Mitte"
        #[arg(long)]
        district: String,
    },
    /// Accident counts per year across the whole city
    Trend {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, output_dir } => {
            let (pipeline_config, file_config) = resolve(&input)?;
            let output_dir = output_dir
                .or(file_config.output_dir)
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_OUTPUT_DIR));

            let start = Instant::now();
            let run = execute(&pipeline_config)?;

            let exported =
                accident_map_export::export_all(&run.results, &run.combined, &output_dir)?;

            print_summary(&run);
            println!(
                "Exported {} yearly CSVs and {} GeoJSON files to {}",
                exported.csv_files.len(),
                exported.geojson_files.len(),
                output_dir.display()
            );
            match &exported.combined_csv {
                Some(path) => println!("Combined dataset: {}", path.display()),
                None => println!("Combined dataset: no records retained, nothing written"),
            }
            log::info!("Run complete in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Seasons { input, district } => {
            let (pipeline_config, _) = resolve(&input)?;
            let run = execute(&pipeline_config)?;

            let Some(shares) = accident_map_analytics::seasonal_distribution(&run.combined, &district)
            else {
                return Err(format!("No records for district: {district}").into());
            };

            println!("Seasonal accident distribution for {district}:");
            for (season, share) in shares {
                println!("  {season:<10} {share:5.1}%");
            }
        }
        Commands::Modes { input, district } => {
            let (pipeline_config, _) = resolve(&input)?;
            let run = execute(&pipeline_config)?;

            let Some(rows) =
                accident_map_analytics::seasonal_mode_distribution(&run.combined, &district)
            else {
                return Err(format!("No records for district: {district}").into());
            };

            println!("Seasonal distribution by transport mode for {district}:");
            for (season, mode, share) in rows {
                println!("  {season:<10} {mode:<12} {share:5.1}%");
            }
        }
        Commands::Trend { input } => {
            let (pipeline_config, _) = resolve(&input)?;
            let run = execute(&pipeline_config)?;

            println!("Accidents per year:");
            for (year, count) in accident_map_analytics::accidents_per_year(&run.combined) {
                println!("  {year}  {count}");
            }
        }
    }

    Ok(())
}

/// Merges command-line flags over the optional config file over the
/// defaults.
fn resolve(input: &InputArgs) -> Result<(PipelineConfig, FileConfig), String> {
    let file_config = match &input.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let pipeline_config = PipelineConfig {
        data_dir: input
            .data_dir
            .clone()
            .or_else(|| file_config.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(config::DEFAULT_DATA_DIR)),
        boundary_file: input
            .boundary_file
            .clone()
            .or_else(|| file_config.boundary_file.clone())
            .unwrap_or_else(|| PathBuf::from(config::DEFAULT_BOUNDARY_FILE)),
        start_year: input
            .start_year
            .or(file_config.start_year)
            .unwrap_or(config::DEFAULT_START_YEAR),
        end_year: input
            .end_year
            .or(file_config.end_year)
            .unwrap_or(config::DEFAULT_END_YEAR),
    };

    if pipeline_config.start_year > pipeline_config.end_year {
        return Err(format!(
            "start_year {} is after end_year {}",
            pipeline_config.start_year, pipeline_config.end_year
        ));
    }

    Ok((pipeline_config, file_config))
}

fn execute(config: &PipelineConfig) -> Result<PipelineRun, accident_map_pipeline::PipelineError> {
    log::info!(
        "Processing years {}-{} from {}",
        config.start_year,
        config.end_year,
        config.data_dir.display()
    );
    accident_map_pipeline::run(config)
}

fn print_summary(run: &PipelineRun) {
    println!("{:<6} OUTCOME", "YEAR");
    println!("{}", "-".repeat(40));
    for (year, outcome) in &run.summary.outcomes {
        match outcome {
            YearOutcome::Processed { count } => {
                println!("{year:<6} {count} records inside city limits");
            }
            YearOutcome::Missing => println!("{year:<6} skipped (source file missing)"),
            YearOutcome::Failed { reason } => println!("{year:<6} failed: {reason}"),
        }
    }
    println!("{}", "-".repeat(40));
    println!(
        "{} processed, {} skipped, {} failed, {} records total",
        run.summary.processed(),
        run.summary.skipped(),
        run.summary.failed(),
        run.summary.total_records()
    );
}
