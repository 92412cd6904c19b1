//! Backtest accounting and the end-to-end pipeline.
//!
//! Prices -> returns -> volatility -> exposure -> scaled returns -> value
//! curves -> statistics. Exposure sized from information through day t is
//! applied to day t+1's return, never to day t's own.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::error::VoltargetError;
use super::exposure::{DEFAULT_EXPOSURE_CAP, DEFAULT_TARGET_VOLATILITY, size_exposure};
use super::metrics::{PerformanceStats, drawdown};
use super::returns::build_returns;
use super::series::TimeSeries;
use super::volatility::{DEFAULT_WINDOW, MIN_WINDOW, TRADING_DAYS_PER_YEAR, rolling_volatility};
use crate::ports::data_port::PriceFeed;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rolling_window: usize,
    pub periods_per_year: u32,
    pub target_volatility: f64,
    pub exposure_cap: f64,
}

pub const DEFAULT_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2015, 1, 1) {
    Some(d) => d,
    None => panic!("2015-01-01 is a valid date"),
};

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbol: "SPY".to_string(),
            start_date: DEFAULT_START_DATE,
            end_date: None,
            rolling_window: DEFAULT_WINDOW,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            target_volatility: DEFAULT_TARGET_VOLATILITY,
            exposure_cap: DEFAULT_EXPOSURE_CAP,
        }
    }
}

impl BacktestConfig {
    /// Check the numeric parameters. Errors name the INI key they come from.
    pub fn validate(&self) -> Result<(), VoltargetError> {
        if self.symbol.trim().is_empty() {
            return Err(VoltargetError::ConfigMissing {
                section: "backtest".to_string(),
                key: "symbol".to_string(),
            });
        }
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(VoltargetError::invalid(
                    "backtest",
                    "end_date",
                    "end_date must be after start_date",
                ));
            }
        }
        if self.rolling_window < MIN_WINDOW {
            return Err(VoltargetError::invalid(
                "strategy",
                "rolling_window",
                format!("rolling_window must be at least {MIN_WINDOW}"),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(VoltargetError::invalid(
                "strategy",
                "periods_per_year",
                "periods_per_year must be positive",
            ));
        }
        if !(self.target_volatility.is_finite() && self.target_volatility > 0.0) {
            return Err(VoltargetError::invalid(
                "strategy",
                "target_volatility",
                "target_volatility must be a positive number",
            ));
        }
        if !(self.exposure_cap.is_finite() && self.exposure_cap > 0.0) {
            return Err(VoltargetError::invalid(
                "strategy",
                "exposure_cap",
                "exposure_cap must be a positive number",
            ));
        }
        Ok(())
    }
}

/// Every series and statistic produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub prices: TimeSeries,
    pub returns: TimeSeries,
    pub volatility: TimeSeries,
    pub exposure: TimeSeries,
    pub scaled_returns: TimeSeries,
    pub strategy_value: TimeSeries,
    pub benchmark_value: TimeSeries,
    pub strategy_drawdown: TimeSeries,
    pub benchmark_drawdown: TimeSeries,
    pub strategy: PerformanceStats,
    pub benchmark: PerformanceStats,
}

/// `scaled[t] = exposure[t-1] * returns[t]`.
pub fn scale_returns(exposure: &TimeSeries, returns: &TimeSeries) -> TimeSeries {
    exposure.shift(1).zip_with(returns, |e, r| Some(e * r))
}

/// Cumulative value starting from 1.0: `value[t] = prod(1 + r[i], i <= t)`.
/// Undefined returns contribute nothing to the product.
pub fn compound(returns: &TimeSeries) -> TimeSeries {
    let values = returns
        .filled(0.0)
        .into_iter()
        .scan(1.0_f64, |value, r| {
            *value *= 1.0 + r;
            Some(Some(*value))
        })
        .collect();
    TimeSeries::derived(returns.dates().to_vec(), values)
}

/// Run the full pipeline over an in-memory price series.
pub fn run_backtest(
    prices: &TimeSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, VoltargetError> {
    config.validate()?;

    let returns = build_returns(prices)?;
    info!(points = returns.len(), "computed returns");

    let volatility = rolling_volatility(&returns, config.rolling_window, config.periods_per_year)?;
    let exposure = size_exposure(&volatility, config.target_volatility, config.exposure_cap);
    debug!(
        window = config.rolling_window,
        defined_vol = volatility.defined_count(),
        defined_exposure = exposure.defined_count(),
        "sized exposure"
    );

    let scaled_returns = scale_returns(&exposure, &returns);
    let strategy_value = compound(&scaled_returns);
    let benchmark_value = compound(&returns);
    let strategy_drawdown = drawdown(&strategy_value);
    let benchmark_drawdown = drawdown(&benchmark_value);

    let strategy = PerformanceStats::compute(&scaled_returns, &strategy_value, config.periods_per_year);
    let benchmark = PerformanceStats::compute(&returns, &benchmark_value, config.periods_per_year);
    info!(
        strategy_final = strategy.final_value,
        benchmark_final = benchmark.final_value,
        "backtest complete"
    );

    Ok(BacktestResult {
        prices: prices.clone(),
        returns,
        volatility,
        exposure,
        scaled_returns,
        strategy_value,
        benchmark_value,
        strategy_drawdown,
        benchmark_drawdown,
        strategy,
        benchmark,
    })
}

/// Fetch prices for the configured symbol and run the pipeline.
pub fn run_with_feed(
    feed: &dyn PriceFeed,
    config: &BacktestConfig,
) -> Result<BacktestResult, VoltargetError> {
    config.validate()?;
    info!(symbol = %config.symbol, start = %config.start_date, "fetching prices");
    let prices = feed.fetch_closes(&config.symbol, config.start_date, config.end_date)?;
    if prices.defined_count() == 0 {
        return Err(VoltargetError::DataUnavailable {
            symbol: config.symbol.clone(),
            reason: "feed returned no prices".to_string(),
        });
    }
    run_backtest(&prices, config)
}
