//! CSV report adapter implementing ReportPort.
//!
//! Writes one CSV file per report sheet into the output directory.
//! Undefined values are written as empty cells.

use std::fs;
use std::path::Path;

use crate::domain::analysis::AnalysisReport;
use crate::domain::asset_metrics::ASSET_METRICS_COLUMNS;
use crate::domain::error::PortmetricsError;
use crate::domain::portfolio_metrics::{
    CONTRIBUTION_LABEL, CONTRIBUTION_SHARE_LABEL, LOG_CONTRIBUTION_LABEL,
};
use crate::domain::series_table::SeriesTable;
use crate::domain::universe::FetchReport;
use crate::ports::report_port::ReportPort;

pub const SHEETS: [&str; 8] = [
    "parameters",
    "portfolio_allocation",
    "portfo_summary",
    "asset_metric",
    "asset_contrib",
    "price_history",
    "price_history_indexed",
    "correlation_matrix",
];

type Rows = Vec<Vec<String>>;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        report: &AnalysisReport,
        fetch: Option<&FetchReport>,
        output: &Path,
    ) -> Result<(), PortmetricsError> {
        fs::create_dir_all(output)?;

        let (header, rows) = parameters_sheet(report, fetch);
        write_sheet(output, "parameters", &header, &rows)?;
        let (header, rows) = allocation_sheet(report);
        write_sheet(output, "portfolio_allocation", &header, &rows)?;
        let (header, rows) = summary_sheet(report);
        write_sheet(output, "portfo_summary", &header, &rows)?;
        let (header, rows) = asset_metric_sheet(report);
        write_sheet(output, "asset_metric", &header, &rows)?;
        let (header, rows) = asset_contrib_sheet(report);
        write_sheet(output, "asset_contrib", &header, &rows)?;
        let (header, rows) = table_sheet(&report.prices);
        write_sheet(output, "price_history", &header, &rows)?;
        let (header, rows) = table_sheet(&report.indexed_prices);
        write_sheet(output, "price_history_indexed", &header, &rows)?;
        let (header, rows) = correlation_sheet(report);
        write_sheet(output, "correlation_matrix", &header, &rows)?;

        tracing::debug!(dir = %output.display(), sheets = SHEETS.len(), "report written");
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn write_sheet(
    dir: &Path,
    name: &str,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<(), PortmetricsError> {
    let path = dir.join(format!("{name}.csv"));
    let report_error = |e: csv::Error| PortmetricsError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    };

    let mut writer = csv::Writer::from_path(&path).map_err(report_error)?;
    writer.write_record(header).map_err(report_error)?;
    for row in rows {
        writer.write_record(row).map_err(report_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn parameters_sheet(report: &AnalysisReport, fetch: Option<&FetchReport>) -> (Vec<String>, Rows) {
    let config = &report.metrics_config;
    let dates = report.prices.dates();
    let date = |d: Option<&chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();

    let mut rows = vec![
        vec!["Start Date".to_string(), date(dates.first())],
        vec!["End Date".to_string(), date(dates.last())],
        vec!["Number of Assets".to_string(), report.asset_count().to_string()],
        vec![
            "Total Allocation (%)".to_string(),
            report.total_allocation().to_string(),
        ],
        vec!["Trading Days".to_string(), config.trading_days.to_string()],
        vec![
            "Risk-Free Rate (annual)".to_string(),
            config.rf_annual_rate.to_string(),
        ],
        vec![
            "Risk-Free Rate (daily)".to_string(),
            report.portfolio.daily_risk_free_rate.to_string(),
        ],
        vec!["Index Base".to_string(), config.base.to_string()],
        vec![
            "Rows Used".to_string(),
            report.portfolio.rows_used.to_string(),
        ],
    ];

    if let Some(fetch) = fetch {
        rows.push(vec!["Requested Tickers".to_string(), fetch.requested.join(" ")]);
        rows.push(vec!["Valid Tickers".to_string(), fetch.valid.join(" ")]);
        let failed: Vec<String> = fetch
            .failed
            .iter()
            .map(|f| format!("{} ({})", f.ticker, f.reason))
            .collect();
        rows.push(vec!["Failed Tickers".to_string(), failed.join("; ")]);
    }

    (header(&["Parameter", "Value"]), rows)
}

fn allocation_sheet(report: &AnalysisReport) -> (Vec<String>, Rows) {
    let rows = report
        .allocation
        .entries()
        .iter()
        .map(|entry| {
            let weight = report.portfolio.contribution(&entry.ticker).map(|c| c.weight);
            vec![entry.ticker.clone(), entry.weight.to_string(), cell(weight)]
        })
        .collect();
    (header(&["Ticker", "Allocation (%)", "Weight"]), rows)
}

fn summary_sheet(report: &AnalysisReport) -> (Vec<String>, Rows) {
    let rows = report
        .portfolio
        .scalar_fields()
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), cell(value)])
        .collect();
    (header(&["Metric", "Value"]), rows)
}

fn asset_metric_sheet(report: &AnalysisReport) -> (Vec<String>, Rows) {
    let mut names = vec!["Ticker"];
    names.extend(ASSET_METRICS_COLUMNS);

    let rows = report
        .asset_metrics
        .iter()
        .map(|m| {
            vec![
                m.ticker.clone(),
                cell(m.annualized_return),
                cell(m.annualized_volatility),
                cell(m.cumulative_return),
                m.observations.map(|n| n.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    (header(&names), rows)
}

fn asset_contrib_sheet(report: &AnalysisReport) -> (Vec<String>, Rows) {
    let rows = report
        .portfolio
        .contributions
        .iter()
        .map(|c| {
            vec![
                c.ticker.clone(),
                c.weight.to_string(),
                c.log_contribution.to_string(),
                c.contribution.to_string(),
                cell(c.contribution_share),
            ]
        })
        .collect();
    (
        header(&[
            "Ticker",
            "Weight",
            LOG_CONTRIBUTION_LABEL,
            CONTRIBUTION_LABEL,
            CONTRIBUTION_SHARE_LABEL,
        ]),
        rows,
    )
}

fn table_sheet(table: &SeriesTable) -> (Vec<String>, Rows) {
    let mut names = vec![table.date_column()];
    names.extend(table.tickers());

    let rows = table
        .dates()
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let mut row = vec![date.to_string()];
            row.extend(table.row(i).into_iter().map(cell));
            row
        })
        .collect();
    (header(&names), rows)
}

fn correlation_sheet(report: &AnalysisReport) -> (Vec<String>, Rows) {
    match &report.correlation {
        Ok(matrix) => {
            let mut names = vec![""];
            names.extend(matrix.tickers.iter().map(String::as_str));
            let rows = matrix
                .tickers
                .iter()
                .zip(&matrix.values)
                .map(|(ticker, values)| {
                    let mut row = vec![ticker.clone()];
                    row.extend(values.iter().copied().map(cell));
                    row
                })
                .collect();
            (header(&names), rows)
        }
        Err(reason) => (header(&["Error"]), vec![vec![reason.clone()]]),
    }
}
