//! Ticker universe resolution and price table assembly.
//!
//! Normalizes the requested ticker list, fetches each ticker through a
//! [`PriceDataPort`], skips tickers that fail or return no usable closes,
//! and outer-joins the survivors into one [`PriceTable`].

use crate::domain::allocation::normalize_ticker;
use crate::domain::error::PortmetricsError;
use crate::domain::series_table::{DEFAULT_DATE_COLUMN, PriceTable, Series, SeriesTable};
use crate::ports::price_port::{ClosePoint, PriceDataPort};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Valid tickers required by default before correlation and portfolio
/// statistics are meaningful.
pub const DEFAULT_MIN_VALID: usize = 2;

/// Outcome of a price fetch, per requested ticker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FetchReport {
    pub requested: Vec<String>,
    pub valid: Vec<String>,
    pub failed: Vec<FailedTicker>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FailedTicker {
    pub ticker: String,
    pub reason: String,
}

/// Trim, uppercase, drop blanks, and de-duplicate keeping first occurrence.
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| normalize_ticker(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

pub fn build_price_table<S: AsRef<str>>(
    port: &dyn PriceDataPort,
    tickers: &[S],
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_valid: usize,
) -> Result<(PriceTable, FetchReport), PortmetricsError> {
    if start_date >= end_date {
        return Err(PortmetricsError::Data {
            reason: "start date must be before end date".into(),
        });
    }

    let requested = normalize_tickers(tickers);
    if requested.is_empty() {
        return Err(PortmetricsError::Data {
            reason: "at least one ticker is required".into(),
        });
    }

    let mut series: Vec<(String, Vec<ClosePoint>)> = Vec::new();
    let mut failed = Vec::new();

    for ticker in &requested {
        let points = match port.fetch_closes(ticker, start_date, end_date) {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "skipping ticker");
                failed.push(FailedTicker {
                    ticker: ticker.clone(),
                    reason: format!("failed to fetch close prices: {e}"),
                });
                continue;
            }
        };

        if points.iter().all(|p| p.close.is_none()) {
            tracing::warn!(ticker = %ticker, "skipping ticker with no close data");
            failed.push(FailedTicker {
                ticker: ticker.clone(),
                reason: "no close price data returned".into(),
            });
            continue;
        }

        tracing::debug!(ticker = %ticker, rows = points.len(), "fetched closes");
        series.push((ticker.clone(), points));
    }

    if series.is_empty() {
        return Err(PortmetricsError::NoValidTickers);
    }
    if series.len() < min_valid {
        return Err(PortmetricsError::InsufficientTickers {
            valid: series.len(),
            minimum: min_valid,
        });
    }

    let table = outer_join(&series)?;
    let report = FetchReport {
        requested,
        valid: series.into_iter().map(|(t, _)| t).collect(),
        failed,
    };
    Ok((table, report))
}

fn outer_join(series: &[(String, Vec<ClosePoint>)]) -> Result<PriceTable, PortmetricsError> {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|(ticker, points)| {
            let by_date: BTreeMap<NaiveDate, Option<f64>> =
                points.iter().map(|p| (p.date, p.close)).collect();
            let values = dates
                .iter()
                .map(|d| by_date.get(d).copied().flatten())
                .collect();
            Series::new(ticker.clone(), values)
        })
        .collect();

    SeriesTable::new(DEFAULT_DATE_COLUMN, dates, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubPort {
        data: HashMap<String, Vec<ClosePoint>>,
    }

    impl PriceDataPort for StubPort {
        fn fetch_closes(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<ClosePoint>, PortmetricsError> {
            self.data.get(ticker).cloned().ok_or_else(|| PortmetricsError::Data {
                reason: format!("unknown ticker {ticker}"),
            })
        }

        fn list_symbols(&self) -> Result<Vec<String>, PortmetricsError> {
            Ok(self.data.keys().cloned().collect())
        }

        fn get_data_range(
            &self,
            _ticker: &str,
        ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PortmetricsError> {
            Ok(None)
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn points(rows: &[(u32, Option<f64>)]) -> Vec<ClosePoint> {
        rows.iter()
            .map(|&(day, close)| ClosePoint { date: d(day), close })
            .collect()
    }

    fn port() -> StubPort {
        let mut data = HashMap::new();
        data.insert("AAPL".to_string(), points(&[(2, Some(10.0)), (3, Some(11.0))]));
        data.insert("MSFT".to_string(), points(&[(1, Some(20.0)), (3, Some(21.0))]));
        data.insert("DEAD".to_string(), points(&[(1, None), (2, None)]));
        StubPort { data }
    }

    #[test]
    fn normalize_tickers_dedupes_in_order() {
        let out = normalize_tickers(&[" aapl", "MSFT", "", "AAPL ", "gld"]);
        assert_eq!(out, vec!["AAPL", "MSFT", "GLD"]);
    }

    #[test]
    fn joins_on_union_of_dates() {
        let (table, report) =
            build_price_table(&port(), &["aapl", "msft"], d(1), d(10), 2).unwrap();

        assert_eq!(table.dates(), &[d(1), d(2), d(3)]);
        assert_eq!(table.date_column(), "Date");
        assert_eq!(
            table.column("AAPL").unwrap().values,
            vec![None, Some(10.0), Some(11.0)]
        );
        assert_eq!(
            table.column("MSFT").unwrap().values,
            vec![Some(20.0), None, Some(21.0)]
        );
        assert_eq!(report.valid, vec!["AAPL", "MSFT"]);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn failed_and_empty_tickers_are_reported() {
        let (table, report) =
            build_price_table(&port(), &["AAPL", "MSFT", "DEAD", "NOPE"], d(1), d(10), 2).unwrap();

        assert_eq!(table.tickers(), vec!["AAPL", "MSFT"]);
        assert_eq!(report.requested.len(), 4);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.ticker.as_str()).collect();
        assert_eq!(failed, vec!["DEAD", "NOPE"]);
    }

    #[test]
    fn below_min_valid_is_error() {
        let result = build_price_table(&port(), &["AAPL", "DEAD"], d(1), d(10), 2);
        assert!(matches!(
            result,
            Err(PortmetricsError::InsufficientTickers { valid: 1, minimum: 2 })
        ));
    }

    #[test]
    fn nothing_valid_is_error() {
        let result = build_price_table(&port(), &["DEAD", "NOPE"], d(1), d(10), 1);
        assert!(matches!(result, Err(PortmetricsError::NoValidTickers)));
    }

    #[test]
    fn rejects_inverted_dates_and_empty_list() {
        assert!(build_price_table(&port(), &["AAPL"], d(5), d(5), 1).is_err());
        let empty: [&str; 0] = [];
        assert!(build_price_table(&port(), &empty, d(1), d(5), 1).is_err());
    }
}
