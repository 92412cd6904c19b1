//! End-to-end pipeline tests.
//!
//! Tests cover:
//! - The worked eight-price scenario against hand-computed values
//! - Exposure cap, zero-volatility safety and window gating
//! - Gap handling from the feed
//! - Feed failures
//! - Property tests for the lag, cap, compounding and drawdown invariants

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use voltarget::domain::backtest::{run_backtest, run_with_feed};
use voltarget::domain::error::VoltargetError;

const SCENARIO: [f64; 8] = [100.0, 102.0, 101.0, 105.0, 103.0, 108.0, 107.0, 110.0];

mod scenario {
    use super::*;

    #[test]
    fn returns_match_price_ratios_exactly() {
        let result = run_backtest(&price_series(&SCENARIO), &config_with_window(3)).unwrap();
        assert_eq!(result.returns.len(), SCENARIO.len() - 1);
        for (t, pair) in SCENARIO.windows(2).enumerate() {
            assert_eq!(result.returns.get(t), Some(pair[1] / pair[0] - 1.0));
        }
    }

    #[test]
    fn volatility_first_defined_at_third_return() {
        let result = run_backtest(&price_series(&SCENARIO), &config_with_window(3)).unwrap();
        assert_eq!(result.volatility.first_defined_index(), Some(2));
        assert_eq!(result.exposure.first_defined_index(), Some(2));
        assert_eq!(result.scaled_returns.first_defined_index(), Some(3));
    }

    #[test]
    fn volatility_and_exposure_match_hand_computation() {
        let result = run_backtest(&price_series(&SCENARIO), &config_with_window(3)).unwrap();
        let r: Vec<f64> = SCENARIO.windows(2).map(|p| p[1] / p[0] - 1.0).collect();

        for t in 2..r.len() {
            let vol = reference_stddev(&r[t - 2..=t]) * 252.0_f64.sqrt();
            let exposure = (0.2 / vol).min(3.0);
            assert_relative_eq!(result.volatility.get(t).unwrap(), vol, epsilon = 1e-12);
            assert_relative_eq!(result.exposure.get(t).unwrap(), exposure, epsilon = 1e-12);
        }
    }

    #[test]
    fn final_values_match_compounded_products() {
        let result = run_backtest(&price_series(&SCENARIO), &config_with_window(3)).unwrap();
        let r: Vec<f64> = SCENARIO.windows(2).map(|p| p[1] / p[0] - 1.0).collect();

        let exposure = |t: usize| {
            let vol = reference_stddev(&r[t - 2..=t]) * 252.0_f64.sqrt();
            (0.2 / vol).min(3.0)
        };
        let strategy: f64 = (3..r.len()).map(|t| 1.0 + exposure(t - 1) * r[t]).product();
        let benchmark: f64 = r.iter().map(|x| 1.0 + x).product();

        assert_relative_eq!(result.strategy.final_value, strategy, epsilon = 1e-9);
        assert_relative_eq!(result.benchmark.final_value, benchmark, epsilon = 1e-9);
        assert_relative_eq!(result.benchmark.final_value, 1.1, epsilon = 1e-9);
    }

    #[test]
    fn statistics_follow_their_definitions() {
        let result = run_backtest(&price_series(&SCENARIO), &config_with_window(3)).unwrap();
        let n = result.strategy_value.len() as f64;

        let expected_ann = result.strategy.final_value.powf(252.0 / n) - 1.0;
        assert_relative_eq!(result.strategy.annualized_return, expected_ann, epsilon = 1e-9);

        let scaled: Vec<f64> = result.scaled_returns.defined().collect();
        let vol = reference_stddev(&scaled) * 252.0_f64.sqrt();
        assert_relative_eq!(
            result.strategy.sharpe_ratio.unwrap(),
            expected_ann / vol,
            epsilon = 1e-9
        );

        let min_dd = result.strategy_drawdown.defined().fold(0.0_f64, f64::min);
        assert_eq!(result.strategy.max_drawdown, min_dd);
        assert!(result.benchmark.max_drawdown < 0.0);
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn exposure_capped_when_volatility_is_tiny() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + 0.1 * i as f64).collect();
        let result = run_backtest(&price_series(&closes), &config_with_window(3)).unwrap();
        assert!(result.exposure.defined_count() > 0);
        assert!(result.exposure.defined().all(|e| e == 3.0));
    }

    #[test]
    fn constant_prices_have_undefined_exposure_and_flat_strategy() {
        let result = run_backtest(&price_series(&[100.0; 10]), &config_with_window(3)).unwrap();

        assert_eq!(result.volatility.get(2), Some(0.0));
        assert_eq!(result.exposure.defined_count(), 0);
        assert_eq!(result.scaled_returns.defined_count(), 0);
        assert!(result.strategy_value.values().iter().all(|v| *v == Some(1.0)));
        assert_eq!(result.strategy.final_value, 1.0);
        assert_eq!(result.strategy.sharpe_ratio, None);
        assert_eq!(result.benchmark.sharpe_ratio, None);
        assert!(result.strategy.annualized_return.is_finite());
    }

    #[test]
    fn price_gap_breaks_volatility_windows() {
        let closes = [
            Some(100.0),
            Some(101.0),
            Some(99.0),
            Some(102.0),
            None,
            Some(103.0),
            Some(101.0),
            Some(104.0),
            Some(102.0),
        ];
        let result = run_backtest(&price_series_with_gaps(&closes), &config_with_window(2)).unwrap();

        // returns 3 and 4 straddle the gap
        assert_eq!(result.returns.values()[3], None);
        assert_eq!(result.returns.values()[4], None);
        assert_eq!(result.volatility.values()[3], None);
        assert_eq!(result.volatility.values()[4], None);
        assert_eq!(result.volatility.values()[5], None);
        assert!(result.volatility.get(6).is_some());
        // gaps contribute nothing to either curve
        assert_eq!(result.benchmark_value.get(3), result.benchmark_value.get(2));
        assert_eq!(result.benchmark_value.get(4), result.benchmark_value.get(2));
    }

    #[test]
    fn too_few_returns_for_window() {
        let err = run_backtest(&price_series(&SCENARIO), &config_with_window(60)).unwrap_err();
        assert!(matches!(
            err,
            VoltargetError::InsufficientData { have: 7, need: 60, .. }
        ));
    }

    #[test]
    fn single_price_is_insufficient() {
        let err = run_backtest(&price_series(&[100.0]), &config_with_window(3)).unwrap_err();
        assert!(matches!(err, VoltargetError::InsufficientData { .. }));
    }
}

mod feed {
    use super::*;

    #[test]
    fn run_with_feed_uses_configured_symbol() {
        let feed = MockPriceFeed::new().with_prices("SPY", price_series(&SCENARIO));
        let result = run_with_feed(&feed, &config_with_window(3)).unwrap();
        assert_relative_eq!(result.benchmark.final_value, 1.1, epsilon = 1e-9);
    }

    #[test]
    fn run_with_feed_respects_start_date() {
        let feed = MockPriceFeed::new().with_prices("SPY", price_series(&SCENARIO));
        let config = voltarget::domain::backtest::BacktestConfig {
            start_date: date(2024, 1, 3),
            ..config_with_window(3)
        };
        let result = run_with_feed(&feed, &config).unwrap();
        assert_eq!(result.prices.len(), SCENARIO.len() - 2);
        assert_eq!(result.prices.first_date(), Some(date(2024, 1, 3)));
    }

    #[test]
    fn feed_failure_is_data_unavailable() {
        let feed = MockPriceFeed::new().with_error("SPY", "connection refused");
        let err = run_with_feed(&feed, &config_with_window(3)).unwrap_err();
        assert!(matches!(
            err,
            VoltargetError::DataUnavailable { reason, .. } if reason == "connection refused"
        ));
    }

    #[test]
    fn empty_feed_is_data_unavailable() {
        let feed = MockPriceFeed::new().with_prices("SPY", price_series(&[]));
        let err = run_with_feed(&feed, &config_with_window(3)).unwrap_err();
        assert!(matches!(err, VoltargetError::DataUnavailable { .. }));
    }

    #[test]
    fn invalid_config_fails_before_fetch() {
        let feed = MockPriceFeed::new().with_error("SPY", "should not be called");
        let config = voltarget::domain::backtest::BacktestConfig {
            exposure_cap: 0.0,
            ..config_with_window(3)
        };
        let err = run_with_feed(&feed, &config).unwrap_err();
        assert!(matches!(err, VoltargetError::ConfigInvalid { .. }));
    }
}

fn price_path() -> impl Strategy<Value = (Vec<f64>, usize)> {
    (2usize..8).prop_flat_map(|window| {
        (
            prop::collection::vec(50.0f64..150.0, window + 2..window + 40),
            Just(window),
        )
    })
}

proptest! {
    #[test]
    fn exposure_never_exceeds_cap((closes, window) in price_path(), cap in 0.5f64..5.0) {
        let config = voltarget::domain::backtest::BacktestConfig {
            exposure_cap: cap,
            ..config_with_window(window)
        };
        let result = run_backtest(&price_series(&closes), &config).unwrap();
        for t in 0..result.exposure.len() {
            if let (Some(e), Some(vol)) = (result.exposure.get(t), result.volatility.get(t)) {
                prop_assert!(e <= cap);
                prop_assert!(e > 0.0);
                if 0.2 / vol < cap {
                    prop_assert!(e < cap);
                }
            }
        }
    }

    #[test]
    fn changing_todays_price_never_changes_earlier_exposure(
        (closes, window) in price_path(),
        bump in 0.5f64..1.5,
    ) {
        let config = config_with_window(window);
        let base = run_backtest(&price_series(&closes), &config).unwrap();

        let mut changed = closes.clone();
        let last = changed.len() - 1;
        changed[last] *= bump;
        let moved = run_backtest(&price_series(&changed), &config).unwrap();

        let n = base.returns.len();
        prop_assert_eq!(&base.exposure.values()[..n - 1], &moved.exposure.values()[..n - 1]);
        prop_assert_eq!(
            &base.scaled_returns.values()[..n - 1],
            &moved.scaled_returns.values()[..n - 1]
        );
        // the last scaled return still uses the unchanged previous exposure
        if let (Some(e), Some(r)) = (moved.exposure.get(n - 2), moved.returns.get(n - 1)) {
            prop_assert_eq!(moved.scaled_returns.get(n - 1), Some(e * r));
        }
    }

    #[test]
    fn window_gating((closes, window) in price_path()) {
        let result = run_backtest(&price_series(&closes), &config_with_window(window)).unwrap();
        prop_assert!(result.volatility.values()[..window - 1].iter().all(Option::is_none));
        prop_assert!(result.volatility.get(window - 1).is_some());
        prop_assert!(result.scaled_returns.values()[..window].iter().all(Option::is_none));
    }

    #[test]
    fn value_curves_are_running_products((closes, window) in price_path()) {
        let result = run_backtest(&price_series(&closes), &config_with_window(window)).unwrap();
        let mut strategy = 1.0;
        let mut benchmark = 1.0;
        for t in 0..result.returns.len() {
            strategy *= 1.0 + result.scaled_returns.get(t).unwrap_or(0.0);
            benchmark *= 1.0 + result.returns.get(t).unwrap_or(0.0);
            prop_assert!((result.strategy_value.get(t).unwrap() - strategy).abs() <= 1e-9 * strategy.abs().max(1.0));
            prop_assert!((result.benchmark_value.get(t).unwrap() - benchmark).abs() <= 1e-9 * benchmark.abs().max(1.0));
        }
    }

    #[test]
    fn drawdown_is_non_positive_and_zero_at_peaks((closes, window) in price_path()) {
        let result = run_backtest(&price_series(&closes), &config_with_window(window)).unwrap();
        for (curve, dd) in [
            (&result.strategy_value, &result.strategy_drawdown),
            (&result.benchmark_value, &result.benchmark_drawdown),
        ] {
            let mut peak = f64::NEG_INFINITY;
            for t in 0..curve.len() {
                let value = curve.get(t).unwrap();
                let d = dd.get(t).unwrap();
                prop_assert!(d <= 0.0);
                if value >= peak {
                    peak = value;
                    prop_assert_eq!(d, 0.0);
                }
            }
        }
    }
}
