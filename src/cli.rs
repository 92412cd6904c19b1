//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::console_report::{ConsoleReport, DEFAULT_HEAD_ROWS, DEFAULT_TAIL_ROWS};
use crate::adapters::csv_adapter::CsvPriceFeed;
use crate::adapters::csv_export::CsvExportReport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::VoltargetError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceFeed;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "voltarget", about = "Volatility-targeting backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a volatility-targeting backtest
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        target_vol: Option<f64>,
        #[arg(long)]
        cap: Option<f64>,
        /// Write every series to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the local data range for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub window: Option<usize>,
    pub target_vol: Option<f64>,
    pub cap: Option<f64>,
    pub export: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, adapter: &mut FileConfigAdapter) {
        if let Some(s) = &self.symbol {
            adapter.set("backtest", "symbol", s);
        }
        if let Some(d) = &self.start_date {
            adapter.set("backtest", "start_date", d);
        }
        if let Some(d) = &self.end_date {
            adapter.set("backtest", "end_date", d);
        }
        if let Some(p) = &self.data_dir {
            adapter.set("backtest", "data_dir", &p.display().to_string());
        }
        if let Some(w) = self.window {
            adapter.set("strategy", "rolling_window", &w.to_string());
        }
        if let Some(v) = self.target_vol {
            adapter.set("strategy", "target_volatility", &v.to_string());
        }
        if let Some(c) = self.cap {
            adapter.set("strategy", "exposure_cap", &c.to_string());
        }
        if let Some(p) = &self.export {
            adapter.set("report", "export_path", &p.display().to_string());
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            start_date,
            end_date,
            data_dir,
            window,
            target_vol,
            cap,
            export,
        } => {
            let overrides = Overrides {
                symbol,
                start_date,
                end_date,
                data_dir,
                window,
                target_vol,
                cap,
                export,
            };
            run_backtest(config.as_ref(), &overrides)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            symbol,
            data_dir,
            config,
        } => run_info(&symbol, data_dir, config.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = VoltargetError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_or_default(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            load_config(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, VoltargetError> {
    let defaults = BacktestConfig::default();

    let symbol = adapter
        .get_string("backtest", "symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap_or(defaults.symbol);
    let start_date: NaiveDate = adapter
        .get_date("backtest", "start_date")?
        .unwrap_or(defaults.start_date);
    let end_date = adapter.get_date("backtest", "end_date")?;

    let rolling_window = adapter.get_int("strategy", "rolling_window", defaults.rolling_window as i64);
    let periods_per_year =
        adapter.get_int("strategy", "periods_per_year", i64::from(defaults.periods_per_year));

    let config = BacktestConfig {
        symbol,
        start_date,
        end_date,
        rolling_window: usize::try_from(rolling_window).map_err(|_| {
            VoltargetError::invalid("strategy", "rolling_window", "rolling_window must be positive")
        })?,
        periods_per_year: u32::try_from(periods_per_year).map_err(|_| {
            VoltargetError::invalid(
                "strategy",
                "periods_per_year",
                "periods_per_year must be a positive integer",
            )
        })?,
        target_volatility: adapter.get_double(
            "strategy",
            "target_volatility",
            defaults.target_volatility,
        ),
        exposure_cap: adapter.get_double("strategy", "exposure_cap", defaults.exposure_cap),
    };
    config.validate()?;
    Ok(config)
}

pub fn build_console_report(adapter: &dyn ConfigPort) -> ConsoleReport {
    let rows = |key: &str, default: usize| {
        usize::try_from(adapter.get_int("report", key, default as i64)).unwrap_or(default)
    };
    ConsoleReport::new(
        rows("head_rows", DEFAULT_HEAD_ROWS),
        rows("tail_rows", DEFAULT_TAIL_ROWS),
    )
}

pub fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("backtest", "data_dir")
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

fn run_backtest(config_path: Option<&PathBuf>, overrides: &Overrides) -> ExitCode {
    // Stage 1: Load config and apply command-line overrides
    let mut adapter = match load_or_default(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    overrides.apply(&mut adapter);

    // Stage 2: Validate and build
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Run against the CSV feed and report
    let feed = CsvPriceFeed::new(data_dir(&adapter));
    let mut reports: Vec<Box<dyn ReportPort>> = vec![Box::new(build_console_report(&adapter))];
    if let Some(path) = adapter
        .get_string("report", "export_path")
        .filter(|s| !s.trim().is_empty())
    {
        reports.push(Box::new(CsvExportReport::new(PathBuf::from(path))));
    }

    match run_backtest_pipeline(&feed, &bt_config, &reports) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_backtest_pipeline(
    feed: &dyn PriceFeed,
    bt_config: &BacktestConfig,
    reports: &[Box<dyn ReportPort>],
) -> Result<(), VoltargetError> {
    info!(
        symbol = %bt_config.symbol,
        window = bt_config.rolling_window,
        target_vol = bt_config.target_volatility,
        cap = bt_config.exposure_cap,
        "running backtest"
    );
    let result = backtest_engine::run_with_feed(feed, bt_config)?;
    for report in reports {
        report.write(&result, bt_config)?;
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match validate_backtest_config(&adapter).and_then(|()| build_backtest_config(&adapter)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("  symbol:            {}", config.symbol);
    eprintln!("  start_date:        {}", config.start_date);
    if let Some(end) = config.end_date {
        eprintln!("  end_date:          {}", end);
    }
    eprintln!("  rolling_window:    {}", config.rolling_window);
    eprintln!("  periods_per_year:  {}", config.periods_per_year);
    eprintln!("  target_volatility: {}", config.target_volatility);
    eprintln!("  exposure_cap:      {}", config.exposure_cap);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(symbol: &str, dir: Option<PathBuf>, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_or_default(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let feed = CsvPriceFeed::new(dir.unwrap_or_else(|| data_dir(&adapter)));

    match feed.get_data_range(symbol) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} rows, {} to {}", symbol.to_uppercase(), count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol.to_uppercase());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
