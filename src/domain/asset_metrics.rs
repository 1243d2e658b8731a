//! Per-asset performance metrics from daily log returns.

use crate::domain::series_table::{ReturnTable, Series, defined};

pub const DEFAULT_TRADING_DAYS: u32 = 252;

pub const ANNUALISED_RETURN_LABEL: &str = "Annualised Return (μ)";
pub const VOLATILITY_LABEL: &str = "StdDev (Volatility σ)";
pub const CUMULATIVE_RETURN_LABEL: &str = "Cumulative Return";
pub const OBSERVATIONS_LABEL: &str = "Observations";

/// Column labels of the asset metrics table, in output order.
pub const ASSET_METRICS_COLUMNS: [&str; 4] = [
    ANNUALISED_RETURN_LABEL,
    VOLATILITY_LABEL,
    CUMULATIVE_RETURN_LABEL,
    OBSERVATIONS_LABEL,
];

/// Metrics for one ticker. A ticker with no return data has every field
/// `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetMetrics {
    pub ticker: String,
    /// mean(daily log return) * trading_days
    pub annualized_return: Option<f64>,
    /// sample stdev (ddof = 1) * sqrt(trading_days); undefined below two
    /// observations.
    pub annualized_volatility: Option<f64>,
    /// exp(sum of log returns) - 1
    pub cumulative_return: Option<f64>,
    pub observations: Option<usize>,
}

impl AssetMetrics {
    fn undefined(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            annualized_return: None,
            annualized_volatility: None,
            cumulative_return: None,
            observations: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.observations.is_some()
    }
}

/// One row per ticker, in the return table's column order.
pub fn asset_metrics(returns: &ReturnTable, trading_days: u32) -> Vec<AssetMetrics> {
    returns
        .columns()
        .iter()
        .map(|column| compute_one(column, f64::from(trading_days)))
        .collect()
}

fn compute_one(column: &Series, trading_days: f64) -> AssetMetrics {
    let values: Vec<f64> = column.present().collect();
    if values.is_empty() {
        return AssetMetrics::undefined(&column.ticker);
    }

    let sum: f64 = values.iter().sum();
    let mean = sum / values.len() as f64;

    AssetMetrics {
        ticker: column.ticker.clone(),
        annualized_return: defined(mean * trading_days),
        annualized_volatility: sample_std(&values).and_then(|s| defined(s * trading_days.sqrt())),
        cumulative_return: defined(sum.exp_m1()),
        observations: Some(values.len()),
    }
}

/// Sample standard deviation with one degree of freedom removed. `None`
/// below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    defined((ss / (n - 1.0)).sqrt())
}
