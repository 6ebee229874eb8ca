//! Expansion of a return series into every rolling window size.
//!
//! For N daily returns there are N window sizes; each produces a
//! cumulative compounded return for every date with a full trailing
//! window. Compounding runs in the log domain: a sliding sum of log
//! returns with an O(1) update per step, exponentiated per emission.
//! Repeated direct multiplication of many near-1 factors drifts
//! differently under floating point; the log-domain sum is the reference
//! formulation.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::data::{ReturnSeries, SeriesType, WindowRecord};

/// Expands a return series into cumulative returns for all window sizes.
pub struct WindowExpander;

impl WindowExpander {
    /// Expand every window size from 1 to the series length.
    ///
    /// Window sizes are independent and fan out across threads; results
    /// are concatenated in window-size order, so output is deterministic
    /// regardless of completion order. Each emitted date contributes two
    /// records, one per series.
    pub fn expand(returns: &ReturnSeries) -> Vec<WindowRecord> {
        let n = returns.len();
        if n == 0 {
            return Vec::new();
        }

        let log_ibov: Vec<f64> = returns.rows.iter().map(|r| r.ibov.ln()).collect();
        let log_cdi: Vec<f64> = returns.rows.iter().map(|r| r.cdi.ln()).collect();

        let progress = AtomicUsize::new(0);

        let per_window: Vec<Vec<WindowRecord>> = (1..=n)
            .into_par_iter()
            .map(|window_size| {
                let records = expand_window(returns, &log_ibov, &log_cdi, window_size);

                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if done % (n / 10).max(1) == 0 || done == n {
                    info!(
                        "window expansion {:.0}% ({}/{} sizes)",
                        done as f64 / n as f64 * 100.0,
                        done,
                        n
                    );
                }

                records
            })
            .collect();

        per_window.into_iter().flatten().collect()
    }

    /// Total records expected for a series of `n` returns: every window
    /// size contributes `n - w + 1` dates, two records each.
    pub fn expected_record_count(n: usize) -> usize {
        (1..=n).map(|w| 2 * (n - w + 1)).sum()
    }
}

/// Records for a single window size over the whole series.
fn expand_window(
    returns: &ReturnSeries,
    log_ibov: &[f64],
    log_cdi: &[f64],
    window_size: usize,
) -> Vec<WindowRecord> {
    let n = returns.len();
    let mut records = Vec::with_capacity(2 * (n - window_size + 1));

    let mut sum_ibov: f64 = log_ibov[..window_size].iter().sum();
    let mut sum_cdi: f64 = log_cdi[..window_size].iter().sum();

    for i in (window_size - 1)..n {
        if i >= window_size {
            sum_ibov += log_ibov[i] - log_ibov[i - window_size];
            sum_cdi += log_cdi[i] - log_cdi[i - window_size];
        }

        let date = returns.rows[i].date;
        records.push(WindowRecord {
            date,
            window_size,
            series: SeriesType::Cdi,
            cumulative_return: sum_cdi.exp(),
        });
        records.push(WindowRecord {
            date,
            window_size,
            series: SeriesType::Ibov,
            cumulative_return: sum_ibov.exp(),
        });
    }

    records
}
