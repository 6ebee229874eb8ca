//! Day-over-day return normalization.

use rust_decimal::Decimal;
use tracing::warn;

use crate::data::{AlignedSeries, ReturnRow, ReturnSeries};

/// Convert aligned levels into period-over-period relative returns.
///
/// `return[i] = value[i] / value[i-1]` independently per column. The first
/// aligned row has no predecessor and is not emitted. A ratio that is not
/// finite and positive is undefined; the whole row is dropped and logged,
/// which keeps both columns on the same date grid for windowing.
pub fn daily_returns(aligned: &AlignedSeries) -> ReturnSeries {
    let mut rows = Vec::with_capacity(aligned.len().saturating_sub(1));

    for pair in aligned.rows.windows(2) {
        let prev = &pair[0];
        let curr = &pair[1];

        let ibov = ratio(curr.ibov, prev.ibov);
        let cdi = ratio(curr.cdi, prev.cdi);

        match (ibov, cdi) {
            (Some(ibov), Some(cdi)) => rows.push(ReturnRow {
                date: curr.date,
                ibov,
                cdi,
            }),
            _ => warn!(date = %curr.date, "undefined return, row dropped"),
        }
    }

    ReturnSeries { rows }
}

fn ratio(curr: Decimal, prev: Decimal) -> Option<f64> {
    let curr: f64 = curr.try_into().unwrap_or(f64::NAN);
    let prev: f64 = prev.try_into().unwrap_or(f64::NAN);

    let r = curr / prev;
    (r.is_finite() && r > 0.0).then_some(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AlignedRow;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn aligned(rows: &[(NaiveDate, i64, i64)]) -> AlignedSeries {
        AlignedSeries {
            rows: rows
                .iter()
                .map(|(date, ibov, cdi)| AlignedRow {
                    date: *date,
                    ibov: Decimal::from(*ibov),
                    cdi: Decimal::from(*cdi),
                })
                .collect(),
        }
    }

    #[test]
    fn test_returns_are_ratios_of_consecutive_levels() {
        let series = aligned(&[
            (d(2020, 1, 2), 100, 1),
            (d(2020, 1, 3), 110, 1),
            (d(2020, 1, 6), 99, 1),
        ]);

        let returns = daily_returns(&series);

        assert_eq!(returns.len(), 2);
        assert!((returns.rows[0].ibov - 1.10).abs() < 1e-9);
        assert!((returns.rows[1].ibov - 0.90).abs() < 1e-9);
        assert!((returns.rows[0].cdi - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_row_is_dropped() {
        let series = aligned(&[(d(2020, 1, 2), 100, 1), (d(2020, 1, 3), 101, 1)]);

        let returns = daily_returns(&series);

        assert_eq!(returns.len(), 1);
        assert_eq!(returns.rows[0].date, d(2020, 1, 3));
    }

    #[test]
    fn test_zero_predecessor_drops_the_row() {
        let series = aligned(&[
            (d(2020, 1, 2), 100, 1),
            (d(2020, 1, 3), 0, 1),
            (d(2020, 1, 6), 110, 1),
        ]);

        let returns = daily_returns(&series);

        // 1/3 divides by 100 but yields 0 (non-positive); 1/6 divides by 0
        let dates: Vec<_> = returns.rows.iter().map(|r| r.date).collect();
        assert!(!dates.contains(&d(2020, 1, 3)));
        assert!(!dates.contains(&d(2020, 1, 6)));
    }

    #[test]
    fn test_empty_alignment_yields_empty_returns() {
        let returns = daily_returns(&AlignedSeries::default());
        assert!(returns.is_empty());
    }
}
