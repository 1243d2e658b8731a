//! Wide CSV price adapter: a single file with a date column followed by one
//! close-price column per ticker, the shape of the price table itself.

use crate::domain::allocation::normalize_ticker;
use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::PortmetricsError;
use crate::domain::series_table::{PriceTable, SeriesTable, coerce_numeric};
use crate::ports::price_port::{ClosePoint, PriceDataPort};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct WideCsvAdapter {
    path: PathBuf,
    cached: OnceLock<PriceTable>,
}

impl WideCsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cached: OnceLock::new(),
        }
    }

    /// Read the whole file as a price table. The first column is the date
    /// column and keeps its header name; ticker headers are normalized.
    pub fn read_price_table(&self) -> Result<PriceTable, PortmetricsError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| self.data_error(e))?;
        let headers = rdr.headers().map_err(|e| self.data_error(e))?.clone();

        let date_column = headers
            .get(0)
            .map(|h| h.trim().to_string())
            .ok_or_else(|| PortmetricsError::Data {
                reason: format!("empty header in {}", self.path.display()),
            })?;
        let tickers: Vec<String> = headers.iter().skip(1).map(normalize_ticker).collect();
        let ticker_refs: Vec<&str> = tickers.iter().map(String::as_str).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.data_error(e))?;
            let date_str = record.get(0).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                PortmetricsError::Data {
                    reason: format!(
                        "invalid date {:?} in {}: {}",
                        date_str,
                        self.path.display(),
                        e
                    ),
                }
            })?;
            let values = (1..=tickers.len())
                .map(|i| record.get(i).and_then(coerce_numeric))
                .collect();
            rows.push((date, values));
        }
        rows.sort_by_key(|(date, _)| *date);

        SeriesTable::from_rows(date_column, &ticker_refs, rows).map_err(|e| PortmetricsError::Data {
            reason: format!("{}: {}", self.path.display(), e),
        })
    }

    fn data_error(&self, e: csv::Error) -> PortmetricsError {
        PortmetricsError::Data {
            reason: format!("CSV error in {}: {}", self.path.display(), e),
        }
    }

    /// The parsed file, read on first use and shared by every port call.
    fn table(&self) -> Result<&PriceTable, PortmetricsError> {
        if let Some(table) = self.cached.get() {
            return Ok(table);
        }
        let table = self.read_price_table()?;
        Ok(self.cached.get_or_init(|| table))
    }

    fn column_points(&self, ticker: &str) -> Result<Option<Vec<ClosePoint>>, PortmetricsError> {
        let table = self.table()?;
        let ticker = normalize_ticker(ticker);
        Ok(table.column(&ticker).map(|column| {
            table
                .dates()
                .iter()
                .zip(&column.values)
                .map(|(&date, &close)| ClosePoint { date, close })
                .collect()
        }))
    }
}

impl PriceDataPort for WideCsvAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, PortmetricsError> {
        let points = self
            .column_points(ticker)?
            .ok_or_else(|| PortmetricsError::Data {
                reason: format!("no column {} in {}", ticker, self.path.display()),
            })?;
        Ok(points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date < end_date)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PortmetricsError> {
        let mut symbols: Vec<String> = self
            .table()?
            .tickers()
            .into_iter()
            .map(String::from)
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PortmetricsError> {
        let priced: Vec<NaiveDate> = self
            .column_points(ticker)?
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.close.is_some())
            .map(|p| p.date)
            .collect();
        Ok(match (priced.first(), priced.last()) {
            (Some(&first), Some(&last)) => Some((first, last, priced.len())),
            _ => None,
        })
    }
}
