//! Return series builder.
//!
//! `r[t] = p[t] / p[t-1] - 1`, stamped with the later date of each pair.
//! A missing price makes both adjacent returns undefined; undefined points at
//! either end of the result are dropped rather than zero-filled.

use tracing::{debug, warn};

use super::error::VoltargetError;
use super::series::TimeSeries;

/// Minimum number of valid prices needed to form a single return.
pub const MIN_PRICES: usize = 2;

/// Replace non-positive or non-finite closes with undefined points.
pub fn clean_prices(prices: &TimeSeries) -> TimeSeries {
    let cleaned = prices.map(|p| (p.is_finite() && p > 0.0).then_some(p));
    let dropped = prices.defined_count() - cleaned.defined_count();
    if dropped > 0 {
        warn!(dropped, "discarded non-positive or non-finite prices");
    }
    cleaned
}

pub fn build_returns(prices: &TimeSeries) -> Result<TimeSeries, VoltargetError> {
    let prices = clean_prices(prices);
    let valid = prices.defined_count();
    if valid < MIN_PRICES {
        return Err(VoltargetError::InsufficientData {
            stage: "returns",
            have: valid,
            need: MIN_PRICES,
        });
    }

    let values = prices
        .values()
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
            _ => None,
        })
        .collect();
    let dates = prices.dates().iter().skip(1).copied().collect();
    let returns = TimeSeries::derived(dates, values).trim();

    if returns.is_empty() {
        // Valid prices exist but none are adjacent.
        return Err(VoltargetError::InsufficientData {
            stage: "returns",
            have: 0,
            need: 1,
        });
    }

    debug!(
        points = returns.len(),
        gaps = returns.len() - returns.defined_count(),
        "built return series"
    );
    Ok(returns)
}
