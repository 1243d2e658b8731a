//! CSV directory price adapter.
//!
//! One file per ticker, `<TICKER>.csv`, with a header row containing a
//! `date` column (YYYY-MM-DD) and a `close` column. File stems and headers
//! match case-insensitively; other columns are ignored. Close cells that do
//! not parse as numbers are read as missing.

use crate::domain::allocation::normalize_ticker;
use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::PortmetricsError;
use crate::domain::series_table::coerce_numeric;
use crate::ports::price_port::{ClosePoint, PriceDataPort};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `(normalized ticker, path)` for every `.csv` file in the directory.
    fn symbol_files(&self) -> Result<Vec<(String, PathBuf)>, PortmetricsError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PortmetricsError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PortmetricsError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            let stem = path.file_stem().map(|s| normalize_ticker(&s.to_string_lossy()));
            match stem {
                Some(ticker) if is_csv && !ticker.is_empty() => files.push((ticker, path)),
                _ => {}
            }
        }
        files.sort();
        Ok(files)
    }

    fn csv_path(&self, ticker: &str) -> Result<Option<PathBuf>, PortmetricsError> {
        let ticker = normalize_ticker(ticker);
        let exact = self.base_path.join(format!("{ticker}.csv"));
        if exact.is_file() {
            return Ok(Some(exact));
        }
        Ok(self
            .symbol_files()?
            .into_iter()
            .find(|(symbol, _)| *symbol == ticker)
            .map(|(_, path)| path))
    }

    fn read_all(&self, ticker: &str) -> Result<Vec<ClosePoint>, PortmetricsError> {
        let path = self.csv_path(ticker)?.ok_or_else(|| PortmetricsError::Data {
            reason: format!("no price file for {} in {}", ticker, self.base_path.display()),
        })?;
        self.read_path(&path)
    }

    fn read_path(&self, path: &Path) -> Result<Vec<ClosePoint>, PortmetricsError> {
        let content = fs::read_to_string(path).map_err(|e| PortmetricsError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        parse_close_csv(&content, path)
    }
}

fn parse_close_csv(content: &str, path: &Path) -> Result<Vec<ClosePoint>, PortmetricsError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().map_err(|e| PortmetricsError::Data {
        reason: format!("CSV header error in {}: {}", path.display(), e),
    })?;

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| PortmetricsError::Data {
                reason: format!("missing {} column in {}", name, path.display()),
            })
    };
    let date_idx = find("date")?;
    let close_idx = find("close")?;

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| PortmetricsError::Data {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;

        let date_str = record.get(date_idx).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
            PortmetricsError::Data {
                reason: format!("invalid date {:?} in {}: {}", date_str, path.display(), e),
            }
        })?;
        let close = record.get(close_idx).and_then(coerce_numeric);

        points.push(ClosePoint { date, close });
    }

    points.sort_by_key(|p| p.date);
    if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(PortmetricsError::Data {
            reason: format!("duplicate date {} in {}", w[0].date, path.display()),
        });
    }
    Ok(points)
}

impl PriceDataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, PortmetricsError> {
        let points = self
            .read_all(ticker)?
            .into_iter()
            .filter(|p| p.date >= start_date && p.date < end_date)
            .collect();
        Ok(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PortmetricsError> {
        let mut symbols: Vec<String> = self
            .symbol_files()?
            .into_iter()
            .map(|(ticker, _)| ticker)
            .collect();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PortmetricsError> {
        let Some(path) = self.csv_path(ticker)? else {
            return Ok(None);
        };
        let priced: Vec<NaiveDate> = self
            .read_path(&path)?
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
