//! Outer-join alignment of the IBOV and CDI series.
//!
//! The two sources publish on different calendars: the exchange skips
//! weekends and holidays, the CDI feed has its own gaps. Alignment joins
//! both on the union of dates and fills the holes so every remaining day
//! has a value in both columns:
//!
//! - a missing CDI entry becomes the neutral factor 1 (no compounding
//!   that day);
//! - a missing IBOV entry carries the last traded level forward, so the
//!   day-over-day ratio computes to exactly 1.
//!
//! Dates on or before the historical floor are discarded; the price
//! source has no reliable data before 1995.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::data::{AlignedRow, AlignedSeries, DatedSeries};

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("no dates remain after alignment and truncation")]
    EmptyAlignment,
}

/// Merges the price and rate series into one gap-free daily table.
pub struct Aligner {
    floor: NaiveDate,
}

impl Default for Aligner {
    fn default() -> Self {
        Self {
            floor: NaiveDate::from_ymd_opt(1994, 12, 31).unwrap(),
        }
    }
}

impl Aligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the historical floor. Only dates strictly after it survive.
    pub fn with_floor(mut self, floor: NaiveDate) -> Self {
        self.floor = floor;
        self
    }

    /// Align the two series over the union of their dates.
    pub fn align(
        &self,
        ibov: &DatedSeries,
        cdi: &DatedSeries,
    ) -> Result<AlignedSeries, AlignError> {
        if ibov.is_empty() || cdi.is_empty() {
            return Err(AlignError::EmptyAlignment);
        }

        let mut dates: Vec<NaiveDate> = ibov
            .iter()
            .map(|(date, _)| *date)
            .chain(cdi.iter().map(|(date, _)| *date))
            .collect();
        dates.sort();
        dates.dedup();

        let mut rows = Vec::with_capacity(dates.len());
        let mut last_ibov: Option<Decimal> = None;

        for date in dates {
            // Track the fill value across pre-floor dates too, so the first
            // surviving date can still carry a level forward.
            if let Some(value) = ibov.get(date) {
                last_ibov = Some(value);
            }

            if date <= self.floor {
                continue;
            }

            // Price history has not started yet; nothing to carry forward.
            let Some(ibov_value) = last_ibov else {
                continue;
            };

            rows.push(AlignedRow {
                date,
                ibov: ibov_value,
                cdi: cdi.get(date).unwrap_or(Decimal::ONE),
            });
        }

        if rows.is_empty() {
            return Err(AlignError::EmptyAlignment);
        }

        debug!(rows = rows.len(), "aligned series");
        Ok(AlignedSeries { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(obs: &[(NaiveDate, i64)]) -> DatedSeries {
        DatedSeries::from_observations(
            obs.iter().map(|(date, v)| (*date, Decimal::from(*v))).collect(),
        )
    }

    #[test]
    fn test_union_covered_in_both_columns() {
        let ibov = series(&[(d(2020, 1, 2), 100), (d(2020, 1, 6), 110)]);
        let cdi = series(&[(d(2020, 1, 3), 1), (d(2020, 1, 6), 1)]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        let dates: Vec<_> = aligned.rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6)]
        );
        // every row has both columns by construction; spot-check values
        assert!(aligned.rows.iter().all(|r| r.ibov > Decimal::ZERO));
        assert!(aligned.rows.iter().all(|r| r.cdi > Decimal::ZERO));
    }

    #[test]
    fn test_price_gap_is_forward_filled() {
        let ibov = series(&[(d(2020, 1, 2), 100), (d(2020, 1, 6), 110)]);
        let cdi = series(&[
            (d(2020, 1, 2), 1),
            (d(2020, 1, 3), 1),
            (d(2020, 1, 6), 1),
        ]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        let jan3 = aligned.rows.iter().find(|r| r.date == d(2020, 1, 3)).unwrap();
        assert_eq!(jan3.ibov, Decimal::from(100));
    }

    #[test]
    fn test_rate_gap_is_neutral_filled_not_forward_filled() {
        let ibov = series(&[
            (d(2020, 1, 2), 100),
            (d(2020, 1, 3), 101),
            (d(2020, 1, 6), 102),
        ]);
        // interior date 2020-01-03 missing; its neighbors have factor 2
        let cdi = series(&[(d(2020, 1, 2), 2), (d(2020, 1, 6), 2)]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        let jan3 = aligned.rows.iter().find(|r| r.date == d(2020, 1, 3)).unwrap();
        assert_eq!(jan3.cdi, Decimal::ONE);
    }

    #[test]
    fn test_floor_truncation_is_strict() {
        let ibov = series(&[(d(1994, 6, 1), 50), (d(1995, 1, 2), 100)]);
        let cdi = series(&[(d(1994, 6, 1), 1), (d(1995, 1, 2), 1)]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        assert_eq!(aligned.first_date(), Some(d(1995, 1, 2)));
    }

    #[test]
    fn test_forward_fill_survives_truncation_boundary() {
        // The last pre-floor level must still fill the first post-floor gap.
        let ibov = series(&[(d(1994, 12, 30), 80)]);
        let cdi = series(&[(d(1995, 1, 2), 1)]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.rows[0].date, d(1995, 1, 2));
        assert_eq!(aligned.rows[0].ibov, Decimal::from(80));
    }

    #[test]
    fn test_dates_before_first_price_are_dropped() {
        let ibov = series(&[(d(2020, 1, 6), 100)]);
        let cdi = series(&[(d(2020, 1, 2), 1), (d(2020, 1, 6), 1)]);

        let aligned = Aligner::new().align(&ibov, &cdi).unwrap();

        assert_eq!(aligned.first_date(), Some(d(2020, 1, 6)));
    }

    #[test]
    fn test_empty_inputs_fail() {
        let empty = DatedSeries::new();
        let nonempty = series(&[(d(2020, 1, 2), 100)]);

        assert!(matches!(
            Aligner::new().align(&empty, &empty),
            Err(AlignError::EmptyAlignment)
        ));
        assert!(matches!(
            Aligner::new().align(&empty, &nonempty),
            Err(AlignError::EmptyAlignment)
        ));
        assert!(matches!(
            Aligner::new().align(&nonempty, &empty),
            Err(AlignError::EmptyAlignment)
        ));
    }

    #[test]
    fn test_everything_before_floor_fails() {
        let ibov = series(&[(d(1990, 1, 2), 100)]);
        let cdi = series(&[(d(1990, 1, 2), 1)]);

        assert!(matches!(
            Aligner::new().align(&ibov, &cdi),
            Err(AlignError::EmptyAlignment)
        ));
    }
}
