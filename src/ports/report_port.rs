//! Report generation port trait.

use crate::domain::backtest::PerformanceResult;
use crate::domain::error::SigtraderError;
use std::path::Path;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, result: &PerformanceResult, output_path: &Path) -> Result<(), SigtraderError>;
}
