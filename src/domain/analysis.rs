//! End-to-end analysis of a price table: returns, rebased prices,
//! correlation, per-asset metrics and portfolio summary in one value.

use crate::domain::allocation::Allocation;
use crate::domain::asset_metrics::{AssetMetrics, DEFAULT_TRADING_DAYS, asset_metrics};
use crate::domain::correlation::{CorrelationMatrix, corr_matrix};
use crate::domain::error::PortmetricsError;
use crate::domain::portfolio_metrics::{DEFAULT_RF_ANNUAL_RATE, PortfolioSummary, portfo_metrics};
use crate::domain::returns::{DEFAULT_BASE, log_return, normalize_to_100};
use crate::domain::series_table::{PriceTable, ReturnTable};
use crate::domain::universe::DEFAULT_MIN_VALID;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub trading_days: u32,
    pub rf_annual_rate: f64,
    /// Index level of the rebased price table.
    pub base: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            trading_days: DEFAULT_TRADING_DAYS,
            rf_annual_rate: DEFAULT_RF_ANNUAL_RATE,
            base: DEFAULT_BASE,
        }
    }
}

/// Everything needed to run an analysis from a configured data source.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub allocation: Allocation,
    pub min_valid: usize,
    pub metrics: MetricsConfig,
}

impl AnalysisConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, allocation: Allocation) -> Self {
        Self {
            start_date,
            end_date,
            allocation,
            min_valid: DEFAULT_MIN_VALID,
            metrics: MetricsConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub prices: PriceTable,
    pub indexed_prices: PriceTable,
    pub returns: ReturnTable,
    /// A correlation failure does not abort the analysis; the reason is kept
    /// for display.
    pub correlation: Result<CorrelationMatrix, String>,
    pub asset_metrics: Vec<AssetMetrics>,
    pub portfolio: PortfolioSummary,
    pub allocation: Allocation,
    pub metrics_config: MetricsConfig,
}

impl AnalysisReport {
    pub fn asset_count(&self) -> usize {
        self.allocation.len()
    }

    pub fn total_allocation(&self) -> f64 {
        self.allocation.total()
    }
}

/// Run every metric over `prices`. Fails only when the portfolio summary
/// cannot be computed.
pub fn run_analysis(
    prices: &PriceTable,
    allocation: &Allocation,
    config: &MetricsConfig,
) -> Result<AnalysisReport, PortmetricsError> {
    let returns = log_return(prices);
    let indexed_prices = normalize_to_100(prices, config.base, None)?;
    let correlation = corr_matrix(&returns).map_err(|e| e.to_string());
    let asset_metrics = asset_metrics(&returns, config.trading_days);
    let portfolio = portfo_metrics(
        &returns,
        allocation,
        config.trading_days,
        config.rf_annual_rate,
    )?;

    Ok(AnalysisReport {
        prices: prices.clone(),
        indexed_prices,
        returns,
        correlation,
        asset_metrics,
        portfolio,
        allocation: allocation.clone(),
        metrics_config: config.clone(),
    })
}
