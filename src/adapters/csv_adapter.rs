//! CSV file price feed.
//!
//! Reads `<base_path>/<SYMBOL>.csv`. The header must carry a `date` column
//! and a `close` (or `adj close`) column; other columns are ignored.

use crate::domain::error::VoltargetError;
use crate::domain::series::TimeSeries;
use crate::ports::config_port::DATE_FORMAT;
use crate::ports::data_port::PriceFeed;
use chrono::NaiveDate;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvPriceFeed {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
}

impl CsvPriceFeed {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn unavailable(symbol: &str, reason: String) -> VoltargetError {
        VoltargetError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        }
    }

    fn locate_columns(symbol: &str, headers: &csv::StringRecord) -> Result<Columns, VoltargetError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let date = find(&["date"])
            .ok_or_else(|| Self::unavailable(symbol, "missing date column".into()))?;
        let close = find(&["close"])
            .or_else(|| find(&["adj close", "adj_close"]))
            .ok_or_else(|| Self::unavailable(symbol, "missing close column".into()))?;
        Ok(Columns { date, close })
    }

    /// Read every row of the file as (date, close) sorted by date.
    fn read_rows(&self, symbol: &str) -> Result<Vec<(NaiveDate, Option<f64>)>, VoltargetError> {
        let path = self.csv_path(symbol);
        let file = File::open(&path).map_err(|e| {
            Self::unavailable(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let malformed =
            |e: csv::Error| Self::unavailable(symbol, format!("malformed {}: {}", path.display(), e));

        let mut rdr = csv::Reader::from_reader(file);
        let headers = rdr.headers().map_err(malformed)?;
        let columns = Self::locate_columns(symbol, headers)?;
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(malformed)?;

            let date_str = record.get(columns.date).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                Self::unavailable(symbol, format!("invalid date '{}': {}", date_str, e))
            })?;

            let close = parse_close(record.get(columns.close).unwrap_or_default())
                .map_err(|reason| Self::unavailable(symbol, format!("{reason} on {date}")))?;
            rows.push((date, close));
        }

        rows.sort_by_key(|(date, _)| *date);
        Ok(rows)
    }
}

/// Empty, `NaN` and `null` cells are gaps; anything else must be a finite number.
fn parse_close(cell: &str) -> Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("invalid close value '{cell}'")),
    }
}

impl PriceFeed for CsvPriceFeed {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, VoltargetError> {
        let rows = self.read_rows(symbol)?;
        let (dates, values): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .filter(|(d, _)| *d >= start_date && end_date.is_none_or(|e| *d <= e))
            .unzip();

        if dates.is_empty() {
            return Err(Self::unavailable(
                symbol,
                format!("no rows on or after {start_date}"),
            ));
        }
        debug!(symbol, rows = dates.len(), "loaded prices from csv");

        TimeSeries::new(dates, values)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError> {
        let rows = self.read_rows(symbol)?;
        Ok(match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => Some((first.0, last.0, rows.len())),
            _ => None,
        })
    }
}
