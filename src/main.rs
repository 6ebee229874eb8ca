//! # Expand windowed returns from the two series files
//! ibov-cdi expand --ibov data/ibov-data.csv --cdi data/cdi-data.csv
//!
//! The CDI file is produced by the `cdi-download` companion binary.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use ibov_cdi::{daily_returns, data, export, Aligner, WindowExpander};

#[derive(Parser)]
#[command(name = "ibov-cdi")]
#[command(about = "Windowed cumulative-return analysis for IBOV vs CDI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand cumulative returns over every window size
    Expand {
        /// Path to the IBOV price CSV
        #[arg(long, default_value = "data/ibov-data.csv")]
        ibov: PathBuf,

        /// Path to the CDI rate CSV
        #[arg(long, default_value = "data/cdi-data.csv")]
        cdi: PathBuf,

        /// Output CSV path
        #[arg(short, long, default_value = "data/raw_windowed.csv")]
        output: PathBuf,

        /// Historical floor: only dates strictly after it are used
        #[arg(long)]
        floor: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ibov_cdi=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Expand {
            ibov,
            cdi,
            output,
            floor,
        } => {
            let start = Instant::now();

            let ibov_series = data::load_ibov_series(&ibov)
                .with_context(|| format!("loading {}", ibov.display()))?;
            let cdi_series = data::load_cdi_series(&cdi)
                .with_context(|| format!("loading {}", cdi.display()))?;
            info!(
                "loaded {} ibov rows, {} cdi rows",
                ibov_series.len(),
                cdi_series.len()
            );

            let mut aligner = Aligner::new();
            if let Some(floor) = floor {
                aligner = aligner.with_floor(floor);
            }

            let aligned = aligner.align(&ibov_series, &cdi_series)?;
            let returns = daily_returns(&aligned);
            info!("{} daily returns after alignment", returns.len());

            let records = WindowExpander::expand(&returns);
            export::write_records_to_path(&output, &records)
                .with_context(|| format!("writing {}", output.display()))?;

            info!(
                "{} records written to {} in {:.1} minutes",
                records.len(),
                output.display(),
                start.elapsed().as_secs_f64() / 60.0
            );
        }
    }

    Ok(())
}
