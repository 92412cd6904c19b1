//! Inverse-volatility exposure sizing.
//!
//! exposure[t] = min(target_vol / vol[t], cap)
//! Undefined wherever vol is undefined, zero or non-finite. No lower clamp.

use super::series::TimeSeries;

pub const DEFAULT_TARGET_VOLATILITY: f64 = 0.20;
pub const DEFAULT_EXPOSURE_CAP: f64 = 3.0;

/// Exposure for a single volatility reading.
pub fn exposure_for(vol: f64, target_vol: f64, cap: f64) -> Option<f64> {
    if vol.is_finite() && vol > 0.0 {
        Some((target_vol / vol).min(cap))
    } else {
        None
    }
}

pub fn size_exposure(volatility: &TimeSeries, target_vol: f64, cap: f64) -> TimeSeries {
    volatility.map(|vol| exposure_for(vol, target_vol, cap))
}
