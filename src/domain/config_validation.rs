//! Configuration validation.
//!
//! Validates all config fields before an analysis runs.

use crate::domain::allocation::{Allocation, MAX_TOTAL_ALLOCATION};
use crate::domain::asset_metrics::DEFAULT_TRADING_DAYS;
use crate::domain::error::PortmetricsError;
use crate::domain::portfolio_metrics::DEFAULT_RF_ANNUAL_RATE;
use crate::domain::returns::DEFAULT_BASE;
use crate::domain::universe::DEFAULT_MIN_VALID;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    validate_data_source(config)?;
    validate_dates(config)?;
    validate_min_valid(config)?;
    validate_allocation(config)?;
    validate_trading_days(config)?;
    validate_risk_free_rate(config)?;
    validate_base(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PortmetricsError {
    PortmetricsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let dir = config.get_non_empty("data", "prices_dir");
    let file = config.get_non_empty("data", "prices_file");
    match (dir, file) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        (Some(_), Some(_)) => Err(invalid(
            "data",
            "prices_file",
            "set either prices_dir or prices_file, not both",
        )),
        (None, None) => Err(PortmetricsError::ConfigMissing {
            section: "data".to_string(),
            key: "prices_dir".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, PortmetricsError> {
    match value.map(str::trim) {
        None | Some("") => Err(PortmetricsError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
            invalid(
                "data",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_min_valid(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    if config.get_int("data", "min_valid", DEFAULT_MIN_VALID as i64) < 1 {
        return Err(invalid("data", "min_valid", "min_valid must be at least 1"));
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let raw = config
        .get_non_empty("portfolio", "allocation")
        .ok_or_else(|| PortmetricsError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "allocation".to_string(),
        })?;

    let allocation =
        Allocation::parse(&raw).map_err(|e| invalid("portfolio", "allocation", e.to_string()))?;

    let total = allocation.total();
    if total > MAX_TOTAL_ALLOCATION {
        return Err(invalid(
            "portfolio",
            "allocation",
            format!("total allocation {total:.2}% exceeds {MAX_TOTAL_ALLOCATION}%"),
        ));
    }
    if total <= 0.0 {
        return Err(invalid(
            "portfolio",
            "allocation",
            "total allocation must be positive",
        ));
    }
    Ok(())
}

fn validate_trading_days(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let value = config.get_int("metrics", "trading_days", i64::from(DEFAULT_TRADING_DAYS));
    if value < 1 || value > i64::from(u32::MAX) {
        return Err(invalid(
            "metrics",
            "trading_days",
            "trading_days must be a positive integer",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let value = config.get_double("metrics", "risk_free_rate", DEFAULT_RF_ANNUAL_RATE);
    if !(value > -1.0 && value < 1.0) {
        return Err(invalid(
            "metrics",
            "risk_free_rate",
            "risk_free_rate must be between -1 and 1",
        ));
    }
    Ok(())
}

fn validate_base(config: &dyn ConfigPort) -> Result<(), PortmetricsError> {
    let value = config.get_double("metrics", "base", DEFAULT_BASE);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid("metrics", "base", "base must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }

        fn valid() -> Self {
            Self::new()
                .set("data", "prices_dir", "/data/prices")
                .set("data", "start_date", "2024-01-01")
                .set("data", "end_date", "2024-12-31")
                .set("portfolio", "allocation", "AAPL:60, MSFT:40")
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn invalid_key(result: Result<(), PortmetricsError>) -> String {
        match result {
            Err(PortmetricsError::ConfigInvalid { key, .. }) => key,
            Err(PortmetricsError::ConfigMissing { key, .. }) => key,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_analysis_config(&MockConfig::valid()).is_ok());
    }

    #[test]
    fn missing_data_source() {
        let config = MockConfig::new()
            .set("data", "start_date", "2024-01-01")
            .set("data", "end_date", "2024-12-31")
            .set("portfolio", "allocation", "A:1");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "prices_dir");
    }

    #[test]
    fn both_data_sources() {
        let config = MockConfig::valid().set("data", "prices_file", "/data/prices.csv");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "prices_file");
    }

    #[test]
    fn start_after_end() {
        let config = MockConfig::valid()
            .set("data", "start_date", "2025-01-01")
            .set("data", "end_date", "2024-01-01");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "start_date");
    }

    #[test]
    fn bad_date_format() {
        let config = MockConfig::valid().set("data", "end_date", "2024/12/31");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "end_date");
    }

    #[test]
    fn missing_allocation() {
        let config = MockConfig::valid().set("portfolio", "allocation", "  ");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "allocation");
    }

    #[test]
    fn allocation_over_100_percent() {
        let config = MockConfig::valid().set("portfolio", "allocation", "AAPL:60, MSFT:50");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn allocation_all_zero() {
        let config = MockConfig::valid().set("portfolio", "allocation", "AAPL:0, MSFT:0");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "allocation");
    }

    #[test]
    fn trading_days_must_be_positive() {
        let config = MockConfig::valid().set("metrics", "trading_days", "0");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "trading_days");
    }

    #[test]
    fn risk_free_rate_range() {
        let config = MockConfig::valid().set("metrics", "risk_free_rate", "1.5");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "risk_free_rate");
        let config = MockConfig::valid().set("metrics", "risk_free_rate", "-0.01");
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn base_must_be_positive() {
        let config = MockConfig::valid().set("metrics", "base", "-100");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "base");
    }

    #[test]
    fn min_valid_must_be_positive() {
        let config = MockConfig::valid().set("data", "min_valid", "0");
        assert_eq!(invalid_key(validate_analysis_config(&config)), "min_valid");
    }

    #[test]
    fn engine_defaults_pass_their_own_checks() {
        let config = MockConfig::valid()
            .set("data", "min_valid", &DEFAULT_MIN_VALID.to_string())
            .set("metrics", "trading_days", &DEFAULT_TRADING_DAYS.to_string())
            .set("metrics", "risk_free_rate", &DEFAULT_RF_ANNUAL_RATE.to_string())
            .set("metrics", "base", &DEFAULT_BASE.to_string());
        assert!(validate_analysis_config(&config).is_ok());
        assert!(validate_analysis_config(&MockConfig::valid()).is_ok());
    }
}
