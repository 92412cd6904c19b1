//! CSV export of every backtest series, one row per return date.

use std::path::PathBuf;

use tracing::info;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::VoltargetError;
use crate::ports::report_port::ReportPort;

pub const HEADER: [&str; 10] = [
    "date",
    "close",
    "return",
    "volatility",
    "exposure",
    "scaled_return",
    "strategy_value",
    "benchmark_value",
    "strategy_drawdown",
    "benchmark_drawdown",
];

pub struct CsvExportReport {
    path: PathBuf,
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvExportReport {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn write_to<W: std::io::Write>(
        result: &BacktestResult,
        writer: W,
    ) -> Result<(), VoltargetError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER)?;

        for (i, date) in result.returns.dates().iter().enumerate() {
            wtr.write_record([
                date.format("%Y-%m-%d").to_string(),
                cell(result.prices.value_at(*date)),
                cell(result.returns.get(i)),
                cell(result.volatility.get(i)),
                cell(result.exposure.get(i)),
                cell(result.scaled_returns.get(i)),
                cell(result.strategy_value.get(i)),
                cell(result.benchmark_value.get(i)),
                cell(result.strategy_drawdown.get(i)),
                cell(result.benchmark_drawdown.get(i)),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvExportReport {
    fn write(&self, result: &BacktestResult, _config: &BacktestConfig) -> Result<(), VoltargetError> {
        let file = std::fs::File::create(&self.path)?;
        Self::write_to(result, file)?;
        info!(path = %self.path.display(), rows = result.returns.len(), "exported series");
        Ok(())
    }
}
