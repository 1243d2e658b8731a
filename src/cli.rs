//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::wide_csv_adapter::WideCsvAdapter;
use crate::domain::allocation::{Allocation, normalize_ticker};
use crate::domain::analysis::{AnalysisConfig, AnalysisReport, MetricsConfig, run_analysis};
use crate::domain::asset_metrics::DEFAULT_TRADING_DAYS;
use crate::domain::config_validation::{parse_date, validate_analysis_config};
use crate::domain::error::PortmetricsError;
use crate::domain::portfolio_metrics::DEFAULT_RF_ANNUAL_RATE;
use crate::domain::returns::DEFAULT_BASE;
use crate::domain::universe::{DEFAULT_MIN_VALID, FetchReport, build_price_table};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "report";

#[derive(Parser, Debug)]
#[command(name = "portmetrics", about = "Portfolio performance metrics from daily prices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an analysis and write the CSV report
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate an analysis configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the configured price source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_analyze(&config, output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PortmetricsError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: PortmetricsError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_analyze(config_path: &Path, output_override: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Build analysis config and price source
    let config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let output = resolve_output_dir(output_override, &adapter);

    // Stages 3-6: Fetch, analyze, summarize, report
    run_analysis_pipeline(data_port.as_ref(), &config, &output)
}

pub fn build_analysis_config(adapter: &dyn ConfigPort) -> Result<AnalysisConfig, PortmetricsError> {
    let start_date = parse_date(adapter.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string("data", "end_date").as_deref(), "end_date")?;

    let raw = adapter
        .get_non_empty("portfolio", "allocation")
        .ok_or_else(|| PortmetricsError::ConfigMissing {
            section: "portfolio".into(),
            key: "allocation".into(),
        })?;
    let allocation = Allocation::parse(&raw).map_err(|e| PortmetricsError::ConfigInvalid {
        section: "portfolio".into(),
        key: "allocation".into(),
        reason: e.to_string(),
    })?;

    let min_valid = adapter.get_int("data", "min_valid", DEFAULT_MIN_VALID as i64);
    let trading_days = adapter.get_int("metrics", "trading_days", i64::from(DEFAULT_TRADING_DAYS));

    Ok(AnalysisConfig {
        start_date,
        end_date,
        allocation,
        min_valid: usize::try_from(min_valid).map_err(|_| PortmetricsError::ConfigInvalid {
            section: "data".into(),
            key: "min_valid".into(),
            reason: "min_valid must not be negative".into(),
        })?,
        metrics: MetricsConfig {
            trading_days: u32::try_from(trading_days).map_err(|_| {
                PortmetricsError::ConfigInvalid {
                    section: "metrics".into(),
                    key: "trading_days".into(),
                    reason: "trading_days must be a positive integer".into(),
                }
            })?,
            rf_annual_rate: adapter.get_double("metrics", "risk_free_rate", DEFAULT_RF_ANNUAL_RATE),
            base: adapter.get_double("metrics", "base", DEFAULT_BASE),
        },
    })
}

/// Price source named by `[data] prices_dir` (one CSV per ticker) or
/// `[data] prices_file` (one wide CSV).
pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn PriceDataPort>, PortmetricsError> {
    if let Some(dir) = adapter.get_non_empty("data", "prices_dir") {
        tracing::debug!(dir = %dir, "using per-ticker CSV directory");
        return Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))));
    }
    if let Some(file) = adapter.get_non_empty("data", "prices_file") {
        tracing::debug!(file = %file, "using wide CSV file");
        return Ok(Box::new(WideCsvAdapter::new(PathBuf::from(file))));
    }
    Err(PortmetricsError::ConfigMissing {
        section: "data".into(),
        key: "prices_dir".into(),
    })
}

pub fn resolve_output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    output_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_non_empty("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// An explicit ticker wins; otherwise the configured allocation's tickers.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, PortmetricsError> {
    if let Some(t) = ticker_override {
        return Ok(vec![normalize_ticker(t)]);
    }
    match config.get_non_empty("portfolio", "allocation") {
        Some(raw) => Ok(Allocation::parse(&raw)?
            .tickers()
            .into_iter()
            .map(String::from)
            .collect()),
        None => Ok(Vec::new()),
    }
}

pub fn run_analysis_pipeline(
    data_port: &dyn PriceDataPort,
    config: &AnalysisConfig,
    output: &Path,
) -> ExitCode {
    // Stage 3: Fetch prices
    let tickers = config.allocation.tickers();
    eprintln!(
        "Fetching {} tickers, {} to {}...",
        tickers.len(),
        config.start_date,
        config.end_date
    );
    let (prices, fetch) = match build_price_table(
        data_port,
        &tickers,
        config.start_date,
        config.end_date,
        config.min_valid,
    ) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    for failed in &fetch.failed {
        eprintln!("warning: skipping {} ({})", failed.ticker, failed.reason);
    }
    eprintln!("  Loaded: {} tickers, {} dates", fetch.valid.len(), prices.len());

    // Stage 4: Compute metrics
    let report = match run_analysis(&prices, &config.allocation, &config.metrics) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    if let Err(reason) = &report.correlation {
        tracing::warn!(%reason, "correlation matrix unavailable");
        eprintln!("warning: correlation matrix unavailable ({reason})");
    }

    // Stage 5: Print summary
    print_summary(&report, &fetch);

    // Stage 6: Write report
    match CsvReportAdapter::new().write(&report, Some(&fetch), output) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn print_summary(report: &AnalysisReport, fetch: &FetchReport) {
    let summary = &report.portfolio;

    println!("=== Portfolio Summary ===");
    println!(
        "Assets:           {} ({} valid)",
        report.asset_count(),
        fetch.valid.len()
    );
    println!("Total Allocation: {:.2}%", report.total_allocation());
    println!("Rows Used:        {}", summary.rows_used);
    println!("Expected Return:  {}", pct(Some(summary.expected_return)));
    println!("Volatility:       {}", pct(summary.volatility));
    println!(
        "Sharpe Ratio:     {}",
        summary
            .sharpe_ratio
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"))
    );
    println!("Max Drawdown:     {}", pct(summary.max_drawdown));
    println!("Cumulative:       {}", pct(Some(summary.cumulative_return)));

    println!("\n=== Per-Asset ===");
    for m in &report.asset_metrics {
        let contribution = summary.contribution(&m.ticker);
        println!(
            "  {}:  return {}, vol {}, cumulative {}, contribution {}",
            m.ticker,
            pct(m.annualized_return),
            pct(m.annualized_volatility),
            pct(m.cumulative_return),
            pct(contribution.map(|c| c.contribution)),
        );
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_analysis_config(&adapter) {
        return fail(e);
    }
    eprintln!("Config validated successfully");

    let config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nPeriod: {} to {}", config.start_date, config.end_date);
    eprintln!("\nAllocation:");
    for entry in config.allocation.entries() {
        eprintln!("  {}: {}%", entry.ticker, entry.weight);
    }
    eprintln!("  total: {}%", config.allocation.total());

    eprintln!("\nMetrics:");
    eprintln!("  trading_days:   {}", config.metrics.trading_days);
    eprintln!("  risk_free_rate: {}", config.metrics.rf_annual_rate);
    eprintln!("  base:           {}", config.metrics.base);
    eprintln!("  min_valid:      {}", config.min_valid);

    eprintln!(
        "\nOutput: {}",
        resolve_output_dir(None, &adapter).display()
    );
    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_analysis_config(&adapter) {
        Ok(()) => {
            eprintln!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let symbols = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let tickers = match resolve_tickers(ticker, &config) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };
    if tickers.is_empty() {
        eprintln!("no tickers given; use --ticker or set [portfolio] allocation");
        return fail(PortmetricsError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "allocation".to_string(),
        });
    }

    for t in &tickers {
        match data_port.get_data_range(t) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} prices, {} to {}", t, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", t);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", t, e);
            }
        }
    }
    ExitCode::SUCCESS
}
