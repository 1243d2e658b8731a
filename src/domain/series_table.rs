//! Rectangular date-indexed tables of per-ticker values.
//!
//! A [`SeriesTable`] is the shape shared by the price table handed over by
//! the data-retrieval side and every table derived from it: one date column
//! plus one column per ticker, where any cell may be missing. Tables are
//! immutable snapshots; every transform builds a new one.

use crate::domain::error::PortmetricsError;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const DEFAULT_DATE_COLUMN: &str = "Date";

/// Table of closing prices.
pub type PriceTable = SeriesTable;
/// Table of daily natural-log returns.
pub type ReturnTable = SeriesTable;

/// One ticker column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Series {
    pub ticker: String,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(ticker: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            ticker: ticker.into(),
            values,
        }
    }

    /// Build a series from raw floats, treating NaN as missing.
    pub fn from_f64(ticker: impl Into<String>, values: &[f64]) -> Self {
        Self::new(ticker, values.iter().map(|&v| defined(v)).collect())
    }

    /// Non-missing values in row order.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// First non-missing value.
    pub fn first_valid(&self) -> Option<f64> {
        self.values.iter().find_map(|v| *v)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeriesTable {
    date_column: String,
    dates: Vec<NaiveDate>,
    columns: Vec<Series>,
}

impl SeriesTable {
    /// Validates that dates are strictly increasing, every column has one
    /// value per date, and tickers are unique.
    pub fn new(
        date_column: impl Into<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<Series>,
    ) -> Result<Self, PortmetricsError> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PortmetricsError::invalid_table(format!(
                "dates must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.values.len() != dates.len() {
                return Err(PortmetricsError::invalid_table(format!(
                    "column {} has {} values for {} dates",
                    column.ticker,
                    column.values.len(),
                    dates.len()
                )));
            }
            if !seen.insert(column.ticker.as_str()) {
                return Err(PortmetricsError::invalid_table(format!(
                    "duplicate column {}",
                    column.ticker
                )));
            }
        }

        Ok(Self {
            date_column: date_column.into(),
            dates,
            columns,
        })
    }

    /// Build a table from dated rows of optional values, one per ticker.
    pub fn from_rows(
        date_column: impl Into<String>,
        tickers: &[&str],
        rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
    ) -> Result<Self, PortmetricsError> {
        let mut columns: Vec<Series> = tickers
            .iter()
            .map(|t| Series::new(*t, Vec::with_capacity(rows.len())))
            .collect();
        let mut dates = Vec::with_capacity(rows.len());

        for (date, values) in rows {
            if values.len() != tickers.len() {
                return Err(PortmetricsError::invalid_table(format!(
                    "row {} has {} values for {} tickers",
                    date,
                    values.len(),
                    tickers.len()
                )));
            }
            dates.push(date);
            for (column, value) in columns.iter_mut().zip(values) {
                column.values.push(value);
            }
        }

        Self::new(date_column, dates, columns)
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, ticker: &str) -> Option<&Series> {
        self.columns.iter().find(|c| c.ticker == ticker)
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.ticker.as_str()).collect()
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Values across every column at row `index`.
    pub fn row(&self, index: usize) -> Vec<Option<f64>> {
        self.columns.iter().map(|c| c.values[index]).collect()
    }

    /// Indices of rows where every column holds a value.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.columns.iter().all(|c| c.values[i].is_some()))
            .collect()
    }

    /// Same dates and date column, new columns. Column lengths are the
    /// caller's responsibility.
    pub(crate) fn with_columns(&self, columns: Vec<Series>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == self.dates.len()));
        Self {
            date_column: self.date_column.clone(),
            dates: self.dates.clone(),
            columns,
        }
    }
}

/// `Some(v)` unless `v` is NaN.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

/// Parse a text cell as a number. Blank, unparseable, or NaN cells are
/// missing.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().and_then(defined)
}
