//! Core domain types and the backtest pipeline.

pub mod series;
pub mod returns;
pub mod volatility;
pub mod exposure;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
