//! BCB citizen-calculator client for CDI correction factors.
//!
//! The central bank calculator answers one date interval per request and
//! returns an HTML result page. The daily series is assembled one day at
//! a time by the `cdi-download` binary, which skips days the calculator
//! cannot answer.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use thiserror::Error;

/// Calculator endpoint ("corrigir pelo CDI" form).
const CALCULATOR_URL: &str =
    "https://www3.bcb.gov.br/CALCIDADAO/publico/corrigirPeloCDI.do?method=corrigirPeloCDI";

/// Minimum interval between calculator requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

/// CSS class of the result table cells in the calculator's response.
const RESULT_CELL_CLASS: &str = "fundoPadraoAClaro3";

/// Index of the correction-factor cell among the result cells.
const FACTOR_CELL_INDEX: usize = 9;

/// Earliest date the calculator has CDI data for.
pub fn first_cdi_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1986, 3, 6).unwrap()
}

#[derive(Error, Debug)]
pub enum RateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDI not available for {start} to {end}")]
    RateUnavailable { start: NaiveDate, end: NaiveDate },

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// HTTP client for the BCB citizen calculator.
pub struct BcbClient {
    client: Client,
    last_request: Instant,
    request_count: u64,
}

impl BcbClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            last_request: Instant::now() - MIN_REQUEST_INTERVAL,
            request_count: 0,
        }
    }

    /// Number of requests made, for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Fetch the CDI correction factor for compounding over `[start, end]`.
    ///
    /// A factor of 1.0001 means the interval compounded to 0.01% growth.
    pub async fn correction_factor(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal, RateError> {
        // Rate limiting
        let elapsed = self.last_request.elapsed();
        if elapsed < MIN_REQUEST_INTERVAL {
            tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
        }

        let payload = form_payload(start, end);

        let response = self
            .client
            .post(CALCULATOR_URL)
            .form(&payload)
            .send()
            .await?;

        self.last_request = Instant::now();
        self.request_count += 1;

        if !response.status().is_success() {
            return Err(RateError::InvalidResponse(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_correction_factor(&body, start, end)
    }
}

impl Default for BcbClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Form fields the calculator expects. Dates are day-first; the correction
/// base value and percentage are fixed.
fn form_payload(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("aba", "5".to_string()),
        ("dataInicial", start.format("%d/%m/%Y").to_string()),
        ("dataFinal", end.format("%d/%m/%Y").to_string()),
        ("valorCorrecao", "1000000,00".to_string()),
        ("percentualCorrecao", "100,00".to_string()),
    ]
}

/// Extract the correction factor from a calculator response page.
///
/// An `msgErro` block means the calculator has no answer for the interval.
/// The factor itself is the tenth result-class cell. This is a plain string
/// scan over the page, not a DOM parse.
fn parse_correction_factor(
    html: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal, RateError> {
    if html.contains("msgErro") {
        return Err(RateError::RateUnavailable { start, end });
    }

    let cell = nth_result_cell(html, FACTOR_CELL_INDEX)
        .ok_or_else(|| RateError::InvalidResponse("result cell not found".to_string()))?;

    parse_pt_br_decimal(cell)
        .ok_or_else(|| RateError::InvalidResponse(format!("unparseable factor '{}'", cell)))
}

/// Text content of the nth cell carrying the result class.
fn nth_result_cell(html: &str, n: usize) -> Option<&str> {
    let mut cursor = 0;
    let mut count = 0;

    while let Some(found) = html[cursor..].find(RESULT_CELL_CLASS) {
        let marker_end = cursor + found + RESULT_CELL_CLASS.len();

        if count == n {
            let text_start = marker_end + html[marker_end..].find('>')? + 1;
            let text_end = text_start + html[text_start..].find('<')?;
            return Some(html[text_start..text_end].trim());
        }

        count += 1;
        cursor = marker_end;
    }

    None
}

/// Parse a pt-BR formatted number (`1.234,56789`).
fn parse_pt_br_decimal(s: &str) -> Option<Decimal> {
    let normalized = s.trim().replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn result_page(cells: &[&str]) -> String {
        let mut html = String::from("<html><body><table>");
        for cell in cells {
            html.push_str(&format!(
                "<td class=\"fundoPadraoAClaro3\">{}</td>",
                cell
            ));
        }
        html.push_str("</table></body></html>");
        html
    }

    #[test]
    fn test_form_payload_dates_are_day_first() {
        let payload = form_payload(d(2020, 1, 2), d(2020, 1, 3));

        assert!(payload.contains(&("dataInicial", "02/01/2020".to_string())));
        assert!(payload.contains(&("dataFinal", "03/01/2020".to_string())));
        assert!(payload.contains(&("valorCorrecao", "1000000,00".to_string())));
    }

    #[test]
    fn test_parse_correction_factor() {
        let mut cells = vec!["x"; 9];
        cells.push("1,00017100");
        let html = result_page(&cells);

        let factor = parse_correction_factor(&html, d(2020, 1, 2), d(2020, 1, 3)).unwrap();
        assert_eq!(factor, "1.00017100".parse().unwrap());
    }

    #[test]
    fn test_parse_correction_factor_with_thousands() {
        let mut cells = vec!["x"; 9];
        cells.push("1.000.171,00");
        let html = result_page(&cells);

        let factor = parse_correction_factor(&html, d(2020, 1, 2), d(2020, 1, 3)).unwrap();
        assert_eq!(factor, "1000171.00".parse().unwrap());
    }

    #[test]
    fn test_error_page_means_unavailable() {
        let html = "<div class=\"msgErro\">Não há taxa para o período</div>";
        let err = parse_correction_factor(html, d(2020, 1, 4), d(2020, 1, 5)).unwrap_err();

        assert!(matches!(err, RateError::RateUnavailable { .. }));
    }

    #[test]
    fn test_missing_cell_is_invalid_response() {
        let html = result_page(&["only", "three", "cells"]);
        let err = parse_correction_factor(&html, d(2020, 1, 2), d(2020, 1, 3)).unwrap_err();

        assert!(matches!(err, RateError::InvalidResponse(_)));
    }

    #[test]
    fn test_nth_result_cell_indexing() {
        let html = result_page(&["a", "b", "c"]);

        assert_eq!(nth_result_cell(&html, 0), Some("a"));
        assert_eq!(nth_result_cell(&html, 2), Some("c"));
        assert_eq!(nth_result_cell(&html, 3), None);
    }

    #[test]
    fn test_first_cdi_date() {
        assert_eq!(first_cdi_date(), d(1986, 3, 6));
    }
}
