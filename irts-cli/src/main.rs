//! IRTS CLI: scrape ANBIMA term-structure parameters into the local dataset.
//!
//! Commands:
//! - (none): update for the business day before today
//! - `update [--date YYYY-MM-DD]`: update for an explicit date (still validated)
//! - `status`: report dataset path, row count, date range and sidecar metadata
//!
//! Exit codes: 0 dataset updated, 3 scrape skipped, 1 failure.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use irts_runner::{run_update, store_status, RunnerConfig, UpdateOutcome};

/// Nothing wrong, but nothing written either.
const EXIT_SKIPPED: i32 = 3;

#[derive(Parser)]
#[command(
    name = "irts",
    about = "IRTS scraper: keep the ANBIMA term-structure parameter dataset current"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file. Defaults apply to every missing key.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the dataset directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one date and merge it into the dataset.
    Update {
        /// Reference date (YYYY-MM-DD). Defaults to the business day before today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Report the stored dataset. Offline: no network access.
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config(cli.config.as_ref(), cli.data_dir)?;

    match cli.command {
        None => run_update_cmd(&config, None),
        Some(Commands::Update { date }) => run_update_cmd(&config, date),
        Some(Commands::Status) => run_status(&config),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("irts={level},irts_core={level},irts_runner={level}").into()
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> Result<RunnerConfig> {
    let mut config = match path {
        Some(path) => RunnerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn run_update_cmd(config: &RunnerConfig, date: Option<NaiveDate>) -> Result<()> {
    let report = run_update(config, date).context("IRTS update failed")?;

    match report.outcome {
        UpdateOutcome::Updated {
            fetched,
            total_rows,
        } => {
            println!(
                "Updated {}: {fetched} rows fetched, {total_rows} rows in {}",
                report.date,
                config.dataset_path().display()
            );
            Ok(())
        }
        UpdateOutcome::Skipped(reason) => {
            println!("Skipped {}: {reason}", report.date);
            std::process::exit(EXIT_SKIPPED);
        }
    }
}

fn run_status(config: &RunnerConfig) -> Result<()> {
    let status = store_status(config).context("reading dataset status")?;

    println!("Dataset:  {}", status.path.display());
    if !status.exists {
        println!("Status:   not created yet");
    } else {
        println!("Rows:     {}", status.row_count);
        match status.date_range {
            Some((first, last)) => println!("Dates:    {first} .. {last}"),
            None => println!("Dates:    none"),
        }
    }
    println!("Holidays: {}", status.holiday_source);

    if let Some(meta) = &status.meta {
        let json = serde_json::to_string_pretty(meta).context("serializing sidecar")?;
        println!("Sidecar:\n{json}");
        if status.exists && meta.row_count != status.row_count {
            println!(
                "Warning:  sidecar reports {} rows, file has {}",
                meta.row_count, status.row_count
            );
        }
    }

    Ok(())
}
