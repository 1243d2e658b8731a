//! Price-to-return transforms: gap-bridging log returns and index-to-base
//! rebasing.

use crate::domain::error::PortmetricsError;
use crate::domain::series_table::{PriceTable, ReturnTable, Series, defined};

pub const DEFAULT_BASE: f64 = 100.0;

/// Natural-log returns between consecutive *available* prices of each
/// column.
///
/// A missing price does not break the chain: the next available price is
/// compared with the last available one. Rows missing in the input stay
/// missing, and the first available observation has no return. Non-positive
/// prices are not filtered; `ln` yields -inf or NaN and the NaN cases
/// surface as missing.
pub fn log_return(prices: &PriceTable) -> ReturnTable {
    let columns = prices
        .columns()
        .iter()
        .map(|column| Series::new(column.ticker.clone(), bridged_log_returns(&column.values)))
        .collect();
    prices.with_columns(columns)
}

fn bridged_log_returns(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last_log: Option<f64> = None;
    prices
        .iter()
        .map(|price| {
            let log_price = price.map(f64::ln)?;
            let ret = last_log.and_then(|prev| defined(log_price - prev));
            last_log = Some(log_price);
            ret
        })
        .collect()
}

/// Rebase each selected column so its first non-missing value (the anchor)
/// becomes `base`.
///
/// Columns without any value stay fully missing. Columns not named in
/// `columns` are copied unchanged; `None` selects every ticker column. The
/// date column and column order are untouched.
pub fn normalize_to_100(
    prices: &PriceTable,
    base: f64,
    columns: Option<&[&str]>,
) -> Result<PriceTable, PortmetricsError> {
    if let Some(selected) = columns {
        if let Some(unknown) = selected.iter().find(|c| prices.column(c).is_none()) {
            return Err(PortmetricsError::invalid_table(format!(
                "unknown column {unknown}"
            )));
        }
    }

    let rebased = prices
        .columns()
        .iter()
        .map(|column| {
            let selected = columns.is_none_or(|names| names.contains(&column.ticker.as_str()));
            if selected {
                rebase(column, base)
            } else {
                column.clone()
            }
        })
        .collect();

    Ok(prices.with_columns(rebased))
}

fn rebase(column: &Series, base: f64) -> Series {
    let values = match column.first_valid() {
        Some(anchor) => column
            .values
            .iter()
            .map(|v| v.and_then(|p| defined(p / anchor * base)))
            .collect(),
        None => vec![None; column.values.len()],
    };
    Series::new(column.ticker.clone(), values)
}
