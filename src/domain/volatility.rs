//! Rolling realized volatility.
//!
//! Sample standard deviation (ddof = 1) over the trailing `window` returns
//! ending at each point, inclusive, scaled by `sqrt(periods_per_year)`.
//! Warmup: the first `window - 1` points are undefined. A window containing
//! an undefined return is itself undefined.

use super::error::VoltargetError;
use super::series::TimeSeries;

pub const DEFAULT_WINDOW: usize = 60;
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Smallest window for which a sample standard deviation exists.
pub const MIN_WINDOW: usize = 2;

/// Sample standard deviation of a slice, `None` below two points.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < MIN_WINDOW {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);
    Some(variance.sqrt())
}

pub fn annualization_factor(periods_per_year: u32) -> f64 {
    f64::from(periods_per_year).sqrt()
}

pub fn rolling_volatility(
    returns: &TimeSeries,
    window: usize,
    periods_per_year: u32,
) -> Result<TimeSeries, VoltargetError> {
    if window < MIN_WINDOW {
        return Err(VoltargetError::invalid(
            "strategy",
            "rolling_window",
            format!("rolling_window must be at least {MIN_WINDOW}"),
        ));
    }
    if returns.len() < window {
        return Err(VoltargetError::InsufficientData {
            stage: "rolling volatility",
            have: returns.len(),
            need: window,
        });
    }

    let scale = annualization_factor(periods_per_year);
    let warmup = std::iter::repeat_n(None, window - 1);
    let rolled = returns.values().windows(window).map(|w| {
        let window_values: Option<Vec<f64>> = w.iter().copied().collect();
        window_values
            .and_then(|v| sample_stddev(&v))
            .map(|sd| sd * scale)
    });
    let values = warmup.chain(rolled).collect();

    Ok(TimeSeries::derived(returns.dates().to_vec(), values))
}
