//! Configuration validation.
//!
//! Checks every config field before a backtest runs. The adapter's numeric
//! getters fall back to defaults on garbage, so numeric keys are re-read as
//! strings here and rejected when present but unparseable.

use std::str::FromStr;

use crate::domain::error::VoltargetError;
use crate::ports::config_port::ConfigPort;

fn parse_optional<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, VoltargetError> {
    match config.get_string(section, key).filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| VoltargetError::invalid(section, key, format!("{key} must be {expected}"))),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    validate_symbol(config)?;
    validate_dates(config)?;
    validate_window(config)?;
    validate_periods_per_year(config)?;
    validate_positive(config, "target_volatility")?;
    validate_positive(config, "exposure_cap")?;
    validate_report(config)?;
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if s.trim().is_empty() => Err(VoltargetError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    let start = config.get_date("backtest", "start_date")?;
    let end = config.get_date("backtest", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(VoltargetError::invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    let window = parse_optional::<i64>(config, "strategy", "rolling_window", "an integer")?;
    if window.is_some_and(|w| w < 2) {
        return Err(VoltargetError::invalid(
            "strategy",
            "rolling_window",
            "rolling_window must be at least 2",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    let periods = parse_optional::<i64>(config, "strategy", "periods_per_year", "an integer")?;
    if periods.is_some_and(|p| p < 1 || p > i64::from(u32::MAX)) {
        return Err(VoltargetError::invalid(
            "strategy",
            "periods_per_year",
            "periods_per_year must be a positive integer",
        ));
    }
    Ok(())
}

fn validate_positive(config: &dyn ConfigPort, key: &str) -> Result<(), VoltargetError> {
    let value = parse_optional::<f64>(config, "strategy", key, "a number")?;
    if value.is_some_and(|v| !(v.is_finite() && v > 0.0)) {
        return Err(VoltargetError::invalid(
            "strategy",
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    for key in ["head_rows", "tail_rows"] {
        parse_optional::<usize>(config, "report", key, "a non-negative integer")?;
    }
    Ok(())
}
