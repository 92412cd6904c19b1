//! Performance metrics and statistics.

use super::series::TimeSeries;
use super::volatility::{annualization_factor, sample_stddev};

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    /// Sample standard deviation of the defined returns, annualized.
    pub annualized_volatility: Option<f64>,
    /// Annualized return over annualized volatility, zero risk-free rate.
    pub sharpe_ratio: Option<f64>,
    /// Most negative point of the drawdown curve (a non-positive fraction).
    pub max_drawdown: f64,
    /// Longest run of consecutive periods spent below a prior peak.
    pub max_drawdown_duration: usize,
}

impl PerformanceStats {
    /// `returns` is the series that was compounded into `curve`.
    pub fn compute(returns: &TimeSeries, curve: &TimeSeries, periods_per_year: u32) -> Self {
        let final_value = curve.last_value().unwrap_or(1.0);
        let total_return = final_value - 1.0;
        let annualized_return = annualized_return(final_value, curve.len(), periods_per_year);

        let defined: Vec<f64> = returns.defined().collect();
        let annualized_volatility =
            sample_stddev(&defined).map(|sd| sd * annualization_factor(periods_per_year));
        let sharpe_ratio = annualized_volatility
            .filter(|vol| *vol > 0.0 && vol.is_finite())
            .map(|vol| annualized_return / vol);

        let dd = drawdown(curve);
        let (max_drawdown, max_drawdown_duration) = drawdown_extremes(&dd);

        PerformanceStats {
            final_value,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
        }
    }
}

/// `final_value ^ (periods_per_year / periods) - 1`. A curve that ended at or
/// below zero has lost everything and reports -1.
pub fn annualized_return(final_value: f64, periods: usize, periods_per_year: u32) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    if final_value <= 0.0 {
        return -1.0;
    }
    final_value.powf(f64::from(periods_per_year) / periods as f64) - 1.0
}

/// Fractional distance below the running peak: `value / peak - 1`.
pub fn drawdown(curve: &TimeSeries) -> TimeSeries {
    let values = curve
        .values()
        .iter()
        .scan(f64::NEG_INFINITY, |peak, v| {
            Some(v.map(|value| {
                *peak = peak.max(value);
                if *peak > 0.0 {
                    (value / *peak - 1.0).min(0.0)
                } else {
                    0.0
                }
            }))
        })
        .collect();
    TimeSeries::derived(curve.dates().to_vec(), values)
}

fn drawdown_extremes(drawdown: &TimeSeries) -> (f64, usize) {
    let max_dd = drawdown.defined().fold(0.0_f64, f64::min);
    let (_, longest) = drawdown.defined().fold((0usize, 0usize), |(run, longest), dd| {
        let run = if dd < 0.0 { run + 1 } else { 0 };
        (run, longest.max(run))
    });
    (max_dd, longest)
}
