//! Console table report implementing ReportPort.
//!
//! Prints the head of the input and intermediate series, the tail of both
//! value curves, and a summary block to stdout.

use std::io::Write as _;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::VoltargetError;
use crate::domain::metrics::PerformanceStats;
use crate::domain::series::TimeSeries;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_HEAD_ROWS: usize = 5;
pub const DEFAULT_TAIL_ROWS: usize = 10;

pub struct ConsoleReport {
    pub head_rows: usize,
    pub tail_rows: usize,
}

impl Default for ConsoleReport {
    fn default() -> Self {
        Self {
            head_rows: DEFAULT_HEAD_ROWS,
            tail_rows: DEFAULT_TAIL_ROWS,
        }
    }
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>14.6}"),
        None => format!("{:>14}", "NaN"),
    }
}

/// Render aligned columns sharing the first column's index.
pub fn format_table(title: &str, columns: &[(&str, &TimeSeries)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));
    out.push_str(&format!("{:<12}", "date"));
    for (name, _) in columns {
        out.push_str(&format!("{name:>14}"));
    }
    out.push('\n');

    let Some((_, index)) = columns.first() else {
        return out;
    };
    for date in index.dates() {
        out.push_str(&format!("{:<12}", date.format("%Y-%m-%d")));
        for (_, series) in columns {
            out.push_str(&format_cell(series.value_at(*date)));
        }
        out.push('\n');
    }
    out
}

fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn format_stats(label: &str, stats: &PerformanceStats) -> String {
    let mut out = String::new();
    let volatility = stats
        .annualized_volatility
        .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0));
    out.push_str(&format!("=== {label} ===\n"));
    out.push_str(&format!("Final Value:      {:.4}\n", stats.final_value));
    out.push_str(&format!("Total Return:     {:.2}%\n", stats.total_return * 100.0));
    out.push_str(&format!("Annualized:       {:.2}%\n", stats.annualized_return * 100.0));
    out.push_str(&format!("Volatility:       {volatility}\n"));
    out.push_str(&format!("Sharpe Ratio:     {}\n", format_ratio(stats.sharpe_ratio)));
    out.push_str(&format!("Max Drawdown:     {:.2}%\n", stats.max_drawdown * 100.0));
    out.push_str(&format!(
        "Max DD Duration:  {} periods\n",
        stats.max_drawdown_duration
    ));
    out
}

impl ConsoleReport {
    pub fn new(head_rows: usize, tail_rows: usize) -> Self {
        Self {
            head_rows,
            tail_rows,
        }
    }

    pub fn render(&self, result: &BacktestResult, config: &BacktestConfig) -> String {
        let head = self.head_rows;
        // show enough rows for the first defined volatility to appear
        let warm_head = head + config.rolling_window;

        let mut out = String::new();
        out.push_str(&format!(
            "{} from {}: window={} target_vol={:.2} cap={:.2}\n\n",
            config.symbol,
            config.start_date,
            config.rolling_window,
            config.target_volatility,
            config.exposure_cap
        ));
        out.push_str(&format_table("PRICES HEAD", &[("close", &result.prices.head(head))]));
        out.push('\n');
        out.push_str(&format_table(
            "RETURNS HEAD",
            &[("return", &result.returns.head(head))],
        ));
        out.push('\n');
        out.push_str(&format_table(
            "VOLATILITY / EXPOSURE HEAD",
            &[
                ("ann_vol", &result.volatility.head(warm_head)),
                ("exposure", &result.exposure),
                ("scaled_ret", &result.scaled_returns),
            ],
        ));
        out.push('\n');
        out.push_str(&format_table(
            "PORTFOLIO TAIL",
            &[
                ("strategy", &result.strategy_value.tail(self.tail_rows)),
                ("benchmark", &result.benchmark_value),
            ],
        ));
        out.push('\n');
        out.push_str(&format_stats("Strategy", &result.strategy));
        out.push('\n');
        out.push_str(&format_stats("Benchmark", &result.benchmark));
        out
    }
}

impl ReportPort for ConsoleReport {
    fn write(&self, result: &BacktestResult, config: &BacktestConfig) -> Result<(), VoltargetError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(self.render(result, config).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
