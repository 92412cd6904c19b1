//! Report output port trait.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::VoltargetError;

/// Port for handing a finished backtest to a reporting collaborator.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, config: &BacktestConfig) -> Result<(), VoltargetError>;
}
