/// Command-line entry point for the pipeline.
///
/// Settings layer in order: built-in defaults, then the optional TOML file,
/// then environment variables, then command-line flags. Acquisition and load
/// failures abort the run with a non-zero exit; cleaning drops and per-table
/// write failures are logged and the remaining stages still run.
use std::path::PathBuf;
use std::process;

use clap::Parser;

use defair_pipeline::config::PipelineConfig;
use defair_pipeline::logging::{self, DataSource, LogLevel};
use defair_pipeline::pipeline;

#[derive(Parser)]
#[command(
    name = "defair_pipeline",
    about = "Builds aligned monthly deforestation and air-pollution series from raw public feeds"
)]
struct Cli {
    /// Generate synthetic raw feeds instead of downloading the live sources
    #[arg(long)]
    synthetic: bool,

    /// Seed for reproducible synthetic feeds (implies --synthetic)
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for raw feeds and SQLite stores
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also append log lines to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Log debug detail and timestamp console lines
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    let min_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logging::init_logger(min_level, cli.log_file.as_deref(), cli.verbose);

    let mut config = PipelineConfig::resolve(cli.config.as_deref());
    config.apply_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if cli.synthetic {
        config.synthetic = true;
    }
    if let Some(seed) = cli.seed {
        config.synthetic = true;
        config.synthetic_seed = Some(seed);
    }

    match pipeline::run(&config) {
        Ok(summary) => {
            logging::info(
                DataSource::System,
                None,
                &format!(
                    "run complete: {} deforestation months and {} pollution months stored, {} aligned",
                    summary.deforestation_months, summary.pollution_months, summary.aligned_months
                ),
            );
        }
        Err(err) => {
            logging::error(DataSource::System, None, &format!("run aborted: {}", err));
            process::exit(1);
        }
    }
}
