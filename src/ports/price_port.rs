//! Price data access port trait.
//!
//! The seam to the data-retrieval side: anything able to return a daily
//! close series per ticker (a CSV directory, a single wide CSV, a market
//! data client) implements it.

use crate::domain::error::PortmetricsError;
use chrono::NaiveDate;

/// One daily close. `None` marks a row the source has but could not price.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

pub trait PriceDataPort {
    /// Daily closes for `ticker` with `start <= date < end`, sorted by date.
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, PortmetricsError>;

    fn list_symbols(&self) -> Result<Vec<String>, PortmetricsError>;

    /// First date, last date, and number of priced rows for `ticker`.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PortmetricsError>;
}
