#![allow(dead_code)]

use chrono::NaiveDate;
use portmetrics::domain::error::PortmetricsError;
use portmetrics::domain::series_table::{Series, SeriesTable};
use portmetrics::ports::price_port::{ClosePoint, PriceDataPort};
use std::collections::HashMap;
use std::process::ExitCode;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<ClosePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, ticker: &str, points: Vec<ClosePoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, PortmetricsError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PortmetricsError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date < end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PortmetricsError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PortmetricsError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PortmetricsError::Data {
                reason: reason.clone(),
            });
        }
        let priced: Vec<NaiveDate> = self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.close.is_some())
                    .map(|p| p.date)
                    .collect()
            })
            .unwrap_or_default();
        Ok(match (priced.first(), priced.last()) {
            (Some(&first), Some(&last)) => Some((first, last, priced.len())),
            _ => None,
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

/// Consecutive daily closes starting at `start`.
pub fn closes(start: NaiveDate, values: &[f64]) -> Vec<ClosePoint> {
    dates(start, values.len())
        .into_iter()
        .zip(values)
        .map(|(date, &close)| ClosePoint {
            date,
            close: Some(close),
        })
        .collect()
}

/// Price table over consecutive days starting 2024-01-01.
pub fn price_table(columns: &[(&str, &[f64])]) -> SeriesTable {
    let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    SeriesTable::new(
        "Date",
        dates(date(2024, 1, 1), n),
        columns
            .iter()
            .map(|(ticker, values)| Series::from_f64(*ticker, values))
            .collect(),
    )
    .unwrap()
}

/// Same as [`price_table`] but with explicit gaps.
pub fn sparse_table(columns: &[(&str, Vec<Option<f64>>)]) -> SeriesTable {
    let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    SeriesTable::new(
        "Date",
        dates(date(2024, 1, 1), n),
        columns
            .iter()
            .map(|(ticker, values)| Series::new(*ticker, values.clone()))
            .collect(),
    )
    .unwrap()
}

/// Geometric random-walk-like closes that never repeat a return.
pub fn generate_closes(count: usize, start_price: f64, drift: f64) -> Vec<f64> {
    let mut price = start_price;
    (0..count)
        .map(|i| {
            let wobble = ((i * 7 % 11) as f64 - 5.0) / 500.0;
            price *= 1.0 + drift + wobble;
            price
        })
        .collect()
}

/// `ExitCode` has no `PartialEq`, so compare its debug form.
pub fn is_success(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}
