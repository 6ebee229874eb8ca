//! CDI Daily Series Downloader
//!
//! Builds the daily CDI factor series by querying the BCB citizen
//! calculator one day at a time and saving the result as CSV.
//!
//! # Usage
//!
//! ```bash
//! # Download the full history
//! cdi-download --output data/cdi-data.csv
//!
//! # Download a specific date range
//! cdi-download --start 2019-01-01 --end 2019-12-31
//!
//! # Resume an interrupted download
//! cdi-download --resume
//! ```
//!
//! Days the calculator cannot answer are skipped: the anchor date stays
//! put, so the next successful request covers the gap and the missing
//! day is simply absent from the output series.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use ibov_cdi::data::{first_cdi_date, BcbClient};

/// CDI series downloader CLI.
#[derive(Parser)]
#[command(name = "cdi-download")]
#[command(about = "Download the daily CDI factor series from the BCB calculator")]
struct Cli {
    /// Start date (YYYY-MM-DD); defaults to the first CDI date
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Output CSV path
    #[arg(short, long, default_value = "data/cdi-data.csv")]
    output: PathBuf,

    /// Resume from previous progress
    #[arg(long)]
    resume: bool,
}

/// One fetched daily factor. Serialized both into the progress file and
/// as a CSV output row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FetchedFactor {
    date: NaiveDate,
    cdi: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FetchFailure {
    date: NaiveDate,
    error: String,
}

/// Download progress tracking.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DownloadProgress {
    factors: Vec<FetchedFactor>,
    /// Anchor date of the last successful fetch.
    previous_date: Option<NaiveDate>,
    /// Next date to request.
    current_date: Option<NaiveDate>,
    total_requests_made: u64,
    errors: Vec<FetchFailure>,
}

impl DownloadProgress {
    fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Self::default(),
            }
        } else {
            Self::default()
        }
    }

    fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn save_to_csv(path: &PathBuf, factors: &[FetchedFactor]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for factor in factors {
        writer.serialize(factor)?;
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ibov_cdi=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let start_date = cli.start.unwrap_or_else(first_cdi_date);
    let end_date = cli.end.unwrap_or_else(|| Utc::now().date_naive());

    let progress_file = cli
        .output
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cdi_download_progress.json");

    let mut progress = if cli.resume {
        DownloadProgress::load(&progress_file)
    } else {
        DownloadProgress::default()
    };

    // The anchor trails the requested date by one day: each request asks
    // the calculator for the factor spanning (previous, current].
    let mut previous_date = progress.previous_date.unwrap_or(start_date);
    let mut current_date = progress
        .current_date
        .unwrap_or(previous_date + Duration::days(1));

    let total_days = (end_date - current_date).num_days().max(0) as u64 + 1;

    println!("Download Plan:");
    println!("  Date range: {} to {}", start_date, end_date);
    println!("  Days remaining: {}", total_days);
    println!("  Already fetched: {}", progress.factors.len());
    println!();

    let pb = ProgressBar::new(total_days);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut client = BcbClient::new();
    let start_time = Instant::now();

    while current_date <= end_date {
        pb.set_message(current_date.to_string());

        match client.correction_factor(previous_date, current_date).await {
            Ok(factor) => {
                progress.factors.push(FetchedFactor {
                    date: current_date,
                    cdi: factor,
                });
                previous_date = current_date;
            }
            Err(e) => {
                // Skip the day; the next success covers the gap.
                warn!("{}: skipped ({})", current_date, e);
                progress.errors.push(FetchFailure {
                    date: current_date,
                    error: e.to_string(),
                });
            }
        }

        current_date += Duration::days(1);
        progress.total_requests_made += 1;

        // Save progress periodically
        if progress.total_requests_made % 100 == 0 {
            progress.previous_date = Some(previous_date);
            progress.current_date = Some(current_date);
            progress.save(&progress_file)?;
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    progress.previous_date = Some(previous_date);
    progress.current_date = Some(current_date);
    progress.save(&progress_file)?;

    save_to_csv(&cli.output, &progress.factors)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    let elapsed = start_time.elapsed();
    println!("\nDownload Complete!");
    println!("  Total requests: {}", progress.total_requests_made);
    println!("  Factors fetched: {}", progress.factors.len());
    println!("  Skipped days: {}", progress.errors.len());
    println!("  Elapsed time: {:.1} minutes", elapsed.as_secs_f64() / 60.0);

    Ok(())
}
