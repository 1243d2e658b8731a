//! Portfolio-level return, risk, and contribution statistics.
//!
//! Weighted daily log returns are aggregated over the rows where every
//! allocated ticker has data. Log returns are additive across both time and
//! assets, so the per-asset log contributions sum exactly to the portfolio's
//! cumulative log return; `diff` exposes that identity for diagnostics.

use crate::domain::allocation::Allocation;
use crate::domain::asset_metrics::sample_std;
use crate::domain::error::PortmetricsError;
use crate::domain::series_table::{ReturnTable, defined};
use chrono::NaiveDate;

pub const DEFAULT_RF_ANNUAL_RATE: f64 = 0.045;

pub const EXPECTED_RETURN_LABEL: &str = "Expected Return (μ)";
pub const VOLATILITY_LABEL: &str = "StdDev (Volatility σ)";
pub const SHARPE_RATIO_LABEL: &str = "Sharpe Ratio";
pub const MAX_DRAWDOWN_LABEL: &str = "Max Drawdown";
pub const CUMULATIVE_RETURN_LABEL: &str = "Cumulative Return";
pub const LOG_CONTRIBUTION_LABEL: &str = "Contribution (log)";
pub const CONTRIBUTION_LABEL: &str = "Contribution";
pub const CONTRIBUTION_SHARE_LABEL: &str = "Contribution Share";
pub const CUMULATIVE_LOG_RETURN_LABEL: &str = "Cumulative Return (Log)";
pub const CONTRIBUTION_LOG_SUM_LABEL: &str = "Cumulative Contribution (Log) Sum";
pub const DIFF_LABEL: &str = "Diff";

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetContribution {
    pub ticker: String,
    /// Normalized weight.
    pub weight: f64,
    /// Sum of weight * daily log return over the rows used.
    pub log_contribution: f64,
    /// exp(log_contribution) - 1
    pub contribution: f64,
    /// log_contribution / sum of all log contributions; undefined when that
    /// sum is zero.
    pub contribution_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub daily_return: f64,
    /// exp(cumulative log return) - 1
    pub growth: f64,
    pub running_peak: f64,
    /// growth / running_peak - 1
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PortfolioSummary {
    pub expected_return: f64,
    pub expected_excess_return: f64,
    pub volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub cumulative_return: f64,
    pub contributions: Vec<AssetContribution>,
    /// Sum of portfolio daily log returns.
    pub cumulative_log_return: f64,
    /// Sum of per-asset log contributions.
    pub contribution_log_sum: f64,
    /// cumulative_log_return - contribution_log_sum, expected to be ~0.
    pub diff: f64,
    pub rows_used: usize,
    pub daily_risk_free_rate: f64,
    pub daily_risk_free_log_rate: f64,
    pub curve: Vec<CurvePoint>,
}

impl PortfolioSummary {
    /// Scalar statistics under their reporting labels.
    pub fn scalar_fields(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            (EXPECTED_RETURN_LABEL, Some(self.expected_return)),
            (VOLATILITY_LABEL, self.volatility),
            (SHARPE_RATIO_LABEL, self.sharpe_ratio),
            (MAX_DRAWDOWN_LABEL, self.max_drawdown),
            (CUMULATIVE_RETURN_LABEL, Some(self.cumulative_return)),
            (CUMULATIVE_LOG_RETURN_LABEL, Some(self.cumulative_log_return)),
            (CONTRIBUTION_LOG_SUM_LABEL, Some(self.contribution_log_sum)),
            (DIFF_LABEL, Some(self.diff)),
        ]
    }

    pub fn contribution(&self, ticker: &str) -> Option<&AssetContribution> {
        self.contributions.iter().find(|c| c.ticker == ticker)
    }
}

/// (1 + annual)^(1 / trading_days) - 1
pub fn daily_risk_free_rate(rf_annual_rate: f64, trading_days: u32) -> f64 {
    (1.0 + rf_annual_rate).powf(1.0 / f64::from(trading_days)) - 1.0
}

/// ln(1 + daily risk-free rate)
pub fn daily_risk_free_log_rate(rf_annual_rate: f64, trading_days: u32) -> f64 {
    daily_risk_free_rate(rf_annual_rate, trading_days).ln_1p()
}

/// Aggregate weighted asset log returns into portfolio statistics.
///
/// Only rows where every allocated ticker present in `returns` has a value
/// are used, for every statistic. Fails with
/// [`PortmetricsError::NoValidRows`] when no such row exists, and with
/// [`PortmetricsError::InvalidAllocation`] when no allocated ticker is in
/// the table or their weights total zero.
pub fn portfo_metrics(
    returns: &ReturnTable,
    allocation: &Allocation,
    trading_days: u32,
    rf_annual_rate: f64,
) -> Result<PortfolioSummary, PortmetricsError> {
    let weights = allocation.normalized_weights(&returns.tickers())?;

    let columns: Vec<&[Option<f64>]> = weights
        .iter()
        .filter_map(|(ticker, _)| returns.column(ticker).map(|c| c.values.as_slice()))
        .collect();

    let rows: Vec<usize> = (0..returns.len())
        .filter(|&i| columns.iter().all(|c| c[i].is_some()))
        .collect();
    if rows.is_empty() {
        return Err(PortmetricsError::NoValidRows);
    }

    // rows x assets of weight * return
    let weighted: Vec<Vec<f64>> = rows
        .iter()
        .map(|&i| {
            columns
                .iter()
                .zip(&weights)
                .map(|(c, (_, w))| c[i].unwrap_or_default() * w)
                .collect()
        })
        .collect();

    let log_contributions: Vec<f64> = (0..weights.len())
        .map(|j| weighted.iter().map(|row| row[j]).sum())
        .collect();
    let contribution_log_sum: f64 = log_contributions.iter().sum();

    let contributions = weights
        .iter()
        .zip(&log_contributions)
        .map(|((ticker, weight), &log_contribution)| AssetContribution {
            ticker: ticker.clone(),
            weight: *weight,
            log_contribution,
            contribution: log_contribution.exp_m1(),
            contribution_share: if contribution_log_sum == 0.0 {
                None
            } else {
                defined(log_contribution / contribution_log_sum)
            },
        })
        .collect();

    let port_returns: Vec<f64> = weighted.iter().map(|row| row.iter().sum()).collect();

    let days = f64::from(trading_days);
    let rf_daily = daily_risk_free_rate(rf_annual_rate, trading_days);
    let rf_daily_log = rf_daily.ln_1p();

    let n = port_returns.len() as f64;
    let cumulative_log_return: f64 = port_returns.iter().sum();
    let mean = cumulative_log_return / n;
    let excess_mean = port_returns.iter().map(|r| r - rf_daily_log).sum::<f64>() / n;

    let expected_return = mean * days;
    let expected_excess_return = excess_mean * days;
    let volatility = sample_std(&port_returns).map(|s| s * days.sqrt());
    let sharpe_ratio = volatility
        .filter(|&sigma| sigma > 0.0)
        .and_then(|sigma| defined(expected_excess_return / sigma));

    let dates = returns.dates();
    let curve = build_curve(rows.iter().map(|&i| dates[i]), &port_returns);
    let max_drawdown = curve
        .iter()
        .map(|p| p.drawdown)
        .filter(|d| !d.is_nan())
        .reduce(f64::min);

    Ok(PortfolioSummary {
        expected_return,
        expected_excess_return,
        volatility,
        sharpe_ratio,
        max_drawdown,
        cumulative_return: cumulative_log_return.exp_m1(),
        contributions,
        cumulative_log_return,
        contribution_log_sum,
        diff: cumulative_log_return - contribution_log_sum,
        rows_used: rows.len(),
        daily_risk_free_rate: rf_daily,
        daily_risk_free_log_rate: rf_daily_log,
        curve,
    })
}

fn build_curve(dates: impl Iterator<Item = NaiveDate>, port_returns: &[f64]) -> Vec<CurvePoint> {
    let mut cumulative = 0.0_f64;
    let mut peak = f64::NEG_INFINITY;
    dates
        .zip(port_returns)
        .map(|(date, &daily_return)| {
            cumulative += daily_return;
            let growth = cumulative.exp_m1();
            peak = peak.max(growth);
            CurvePoint {
                date,
                daily_return,
                growth,
                running_peak: peak,
                drawdown: growth / peak - 1.0,
            }
        })
        .collect()
}
