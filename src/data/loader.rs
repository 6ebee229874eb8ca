//! CSV loader for daily series files.
//!
//! Both input files are plain tabular sources with a date column and a
//! value column per row. IBOV exports use day-first dates (`31/12/2019`)
//! and pt-BR decimals (`1.234,56`); CDI exports use ISO dates and plain
//! decimals. Column selection: the column named `date` (or the first
//! column when none is named that) holds the date; the value column is
//! selected by name, or defaults to the column following the date column.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use super::types::DatedSeries;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed record at line {line}: {detail}")]
    MalformedRecord { line: u64, detail: String },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parsing options for a series file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Parse dates as DD/MM/YYYY before trying ISO.
    pub day_first: bool,
    /// Name of the value column. Defaults to the column after the date.
    pub value_column: Option<String>,
}

/// Load a series from a file path.
pub fn load_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<DatedSeries, LoaderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoaderError::SourceUnavailable {
        path: path.display().to_string(),
        source,
    })?;

    let series = load_from_reader(file, options)?;
    debug!(
        path = %path.display(),
        rows = series.len(),
        "loaded series"
    );
    Ok(series)
}

/// Load a series from any reader.
pub fn load_from_reader<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<DatedSeries, LoaderError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("date"))
        .unwrap_or(0);

    let value_idx = match &options.value_column {
        Some(name) => headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| LoaderError::MissingColumn(name.clone()))?,
        None => date_idx + 1,
    };

    let mut observations = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let date_field = record
            .get(date_idx)
            .ok_or_else(|| LoaderError::MalformedRecord {
                line,
                detail: "missing date field".to_string(),
            })?;
        let value_field = record
            .get(value_idx)
            .ok_or_else(|| LoaderError::MalformedRecord {
                line,
                detail: "missing value field".to_string(),
            })?;

        let date = parse_date(date_field, options.day_first).ok_or_else(|| {
            LoaderError::MalformedRecord {
                line,
                detail: format!("unparseable date '{}'", date_field),
            }
        })?;

        let value =
            parse_locale_decimal(value_field).ok_or_else(|| LoaderError::MalformedRecord {
                line,
                detail: format!("unparseable value '{}'", value_field),
            })?;

        observations.push((date, value));
    }

    Ok(DatedSeries::from_observations(observations))
}

/// Load an IBOV price file: day-first dates, `ibov_adj` value column.
pub fn load_ibov_series(path: impl AsRef<Path>) -> Result<DatedSeries, LoaderError> {
    load_from_path(
        path,
        &LoadOptions {
            day_first: true,
            value_column: Some("ibov_adj".to_string()),
        },
    )
}

/// Load a CDI rate file: ISO dates, `cdi` value column.
pub fn load_cdi_series(path: impl AsRef<Path>) -> Result<DatedSeries, LoaderError> {
    load_from_path(
        path,
        &LoadOptions {
            day_first: false,
            value_column: Some("cdi".to_string()),
        },
    )
}

fn parse_date(s: &str, day_first: bool) -> Option<NaiveDate> {
    let s = s.trim();
    let formats: &[&str] = if day_first {
        &["%d/%m/%Y", "%Y-%m-%d"]
    } else {
        &["%Y-%m-%d", "%d/%m/%Y"]
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a decimal that may use pt-BR separators (`1.234,56`).
fn parse_locale_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.contains(',') {
        // '.' is a thousands separator in this form
        let normalized = s.replace('.', "").replace(',', ".");
        normalized.parse().ok()
    } else {
        s.parse().ok()
    }
}
