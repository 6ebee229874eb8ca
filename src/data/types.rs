//! Core data types for the windowed-return pipeline.
//!
//! These types carry the two daily series (IBOV index level, CDI daily
//! growth factor) through alignment, return normalization, and window
//! expansion.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which leg of the comparison a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    /// Daily CDI compounding factor (rate leg).
    Cdi,
    /// IBOV index level (price leg).
    Ibov,
}

impl SeriesType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cdi" => Some(Self::Cdi),
            "ibov" | "ibov_adj" => Some(Self::Ibov),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdi => "cdi",
            Self::Ibov => "ibov",
        }
    }
}

/// An ordered daily series: one value per calendar date, strictly
/// increasing by date.
///
/// Construction sorts the observations and deduplicates by date, keeping
/// the last value seen for a repeated date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedSeries {
    observations: Vec<(NaiveDate, Decimal)>,
}

impl DatedSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from raw observations.
    pub fn from_observations(mut observations: Vec<(NaiveDate, Decimal)>) -> Self {
        observations.sort_by_key(|(date, _)| *date);

        let mut deduped: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(observations.len());
        for (date, value) in observations {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => deduped.push((date, value)),
            }
        }

        Self {
            observations: deduped,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Value observed on an exact date.
    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.observations
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| self.observations[idx].1)
    }

    /// Most recent value observed on or before the given date.
    pub fn latest_at(&self, date: NaiveDate) -> Option<Decimal> {
        match self.observations.binary_search_by_key(&date, |(d, _)| *d) {
            Ok(idx) => Some(self.observations[idx].1),
            Err(0) => None,
            Err(idx) => Some(self.observations[idx - 1].1),
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|(d, _)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NaiveDate, Decimal)> {
        self.observations.iter()
    }
}

/// One day of the merged series, both columns defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub ibov: Decimal,
    pub cdi: Decimal,
}

/// The outer-joined, gap-filled daily series, ascending by date.
///
/// Invariant: every row has both columns defined. CDI gaps are filled with
/// the neutral factor 1; IBOV gaps carry the last traded level forward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    pub rows: Vec<AlignedRow>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// One day of period-over-period relative returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRow {
    pub date: NaiveDate,
    pub ibov: f64,
    pub cdi: f64,
}

impl ReturnRow {
    pub fn value(&self, series: SeriesType) -> f64 {
        match series {
            SeriesType::Cdi => self.cdi,
            SeriesType::Ibov => self.ibov,
        }
    }
}

/// Daily returns derived from an [`AlignedSeries`].
///
/// The first aligned row has no predecessor and is not represented here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnSeries {
    pub rows: Vec<ReturnRow>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cumulative compounded return over one trailing window, for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Date the window ends on.
    pub date: NaiveDate,

    /// Number of trailing periods compounded.
    pub window_size: usize,

    /// Which series the return belongs to.
    #[serde(rename = "type")]
    pub series: SeriesType,

    /// Compounded growth factor over the window.
    #[serde(rename = "return")]
    pub cumulative_return: f64,
}
