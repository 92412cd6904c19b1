#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use voltarget::domain::backtest::BacktestConfig;
use voltarget::domain::error::VoltargetError;
use voltarget::domain::series::TimeSeries;
use voltarget::ports::data_port::PriceFeed;

pub struct MockPriceFeed {
    pub data: HashMap<String, TimeSeries>,
    pub errors: HashMap<String, String>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: TimeSeries) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceFeed for MockPriceFeed {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, VoltargetError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VoltargetError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(series) => Ok(series.between(start_date, end_date)),
            None => Err(VoltargetError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "unknown symbol".to_string(),
            }),
        }
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError> {
        Ok(self.data.get(symbol).and_then(|s| match (s.first_date(), s.last_date()) {
            (Some(first), Some(last)) => Some((first, last, s.len())),
            _ => None,
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn daily_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

pub fn price_series(closes: &[f64]) -> TimeSeries {
    TimeSeries::from_values(daily_dates(date(2024, 1, 1), closes.len()), closes.to_vec()).unwrap()
}

pub fn price_series_with_gaps(closes: &[Option<f64>]) -> TimeSeries {
    TimeSeries::new(daily_dates(date(2024, 1, 1), closes.len()), closes.to_vec()).unwrap()
}

pub fn config_with_window(window: usize) -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        rolling_window: window,
        ..BacktestConfig::default()
    }
}

/// Sample standard deviation written out longhand for cross-checking.
pub fn reference_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Write `<dir>/<SYMBOL>.csv` with a date,close layout.
pub fn write_price_csv(dir: &std::path::Path, symbol: &str, start: NaiveDate, closes: &[f64]) {
    let mut content = String::from("date,close\n");
    for (d, c) in daily_dates(start, closes.len()).iter().zip(closes) {
        content.push_str(&format!("{},{}\n", d.format("%Y-%m-%d"), c));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
