//! Backtest runner.
//!
//! A run is a pure function of the bar table, the strategy and the config:
//! trim warm-up rows, aggregate buy and sell signals, derive the holding
//! column, simulate the portfolio, compute the buy-and-hold baseline and
//! return an annotated copy of the table.

use tracing::info;

use super::bar_table::{BarTable, Column};
use super::baseline::{buy_and_hold, Baseline};
use super::error::SigtraderError;
use super::holding::holding_signal;
use super::metrics::Metrics;
use super::portfolio::{simulate, EquityPoint};
use super::position::ClosedTrade;
use super::signal::{aggregate, ConditionWarning, Side};
use super::strategy::Strategy;

pub const DEFAULT_STARTING_CASH: f64 = 100_000.0;

pub const HOLDING_COLUMN: &str = "holding_signal";
pub const STRATEGY_VALUE_COLUMN: &str = "strategy_value";
pub const BASELINE_VALUE_COLUMN: &str = "baseline_value";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_cash: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_cash: DEFAULT_STARTING_CASH,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if !self.starting_cash.is_finite() || self.starting_cash <= 0.0 {
            return Err(SigtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "starting_cash".into(),
                reason: format!("must be a positive number, got {}", self.starting_cash),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceResult {
    pub final_value: f64,
    pub pct_change: f64,
    pub num_trades: usize,
    pub win_rate: f64,
    pub metrics: Metrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub baseline: Baseline,
    /// Input rows after warm-up trimming, with signal and value columns.
    pub table: BarTable,
    pub warnings: Vec<ConditionWarning>,
}

pub fn run_backtest(
    table: &BarTable,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<PerformanceResult, SigtraderError> {
    config.validate()?;

    let trimmed = table.trim_undefined_leading_rows();
    if trimmed.is_empty() {
        return Err(SigtraderError::EmptyInput { rows: table.len() });
    }
    info!(
        strategy = %strategy.name,
        rows = trimmed.len(),
        warmup_rows = table.len() - trimmed.len(),
        "running backtest"
    );

    let buy = aggregate(Side::Buy, &strategy.buy_conditions, &trimmed);
    let sell = aggregate(Side::Sell, &strategy.sell_conditions, &trimmed);
    let holding = holding_signal(&buy.signal, &sell.signal);

    let portfolio = simulate(trimmed.bars(), &holding, config.starting_cash);
    let metrics = Metrics::compute(&portfolio);
    let baseline = buy_and_hold(trimmed.bars(), config.starting_cash);

    let mut annotated = trimmed;
    for (condition, values) in buy.accepted.iter().chain(&sell.accepted) {
        annotated = annotated.with_column(condition.as_str(), flags(values))?;
    }
    annotated = annotated
        .with_column(Side::Buy.column(), flags(&buy.signal))?
        .with_column(Side::Sell.column(), flags(&sell.signal))?
        .with_column(HOLDING_COLUMN, flags(&holding))?
        .with_column(STRATEGY_VALUE_COLUMN, curve_values(&portfolio.equity_curve))?
        .with_column(BASELINE_VALUE_COLUMN, curve_values(&baseline.curve))?;

    let final_value = portfolio.cash;
    let pct_change = final_value / config.starting_cash - 1.0;

    info!(
        final_value,
        pct_change,
        num_trades = metrics.num_trades,
        baseline_final_value = baseline.final_value,
        "backtest complete"
    );

    let mut warnings = buy.warnings;
    warnings.extend(sell.warnings);

    Ok(PerformanceResult {
        final_value,
        pct_change,
        num_trades: metrics.num_trades,
        win_rate: metrics.win_rate,
        trades: portfolio.closed_trades,
        equity_curve: portfolio.equity_curve,
        metrics,
        baseline,
        table: annotated,
        warnings,
    })
}

fn flags(values: &[bool]) -> Column {
    values
        .iter()
        .map(|&b| Some(if b { 1.0 } else { 0.0 }))
        .collect()
}

fn curve_values(curve: &[EquityPoint]) -> Column {
    curve.iter().map(|p| Some(p.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn table(closes: &[f64]) -> BarTable {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100.0,
            })
            .collect();
        BarTable::from_bars(bars).unwrap()
    }

    fn flag_column(result: &PerformanceResult, name: &str) -> Vec<u8> {
        result
            .table
            .derived(name)
            .unwrap()
            .iter()
            .map(|v| v.unwrap() as u8)
            .collect()
    }

    #[test]
    fn default_config() {
        assert_eq!(BacktestConfig::default().starting_cash, 100_000.0);
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_cash() {
        for cash in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = BacktestConfig { starting_cash: cash }.validate().unwrap_err();
            assert!(matches!(err, SigtraderError::ConfigInvalid { .. }));
        }
    }

    #[test]
    fn example_scenario() {
        let t = table(&[10.0, 10.0, 10.0, 12.0, 12.0, 8.0, 8.0]);
        let strategy = Strategy::new("test")
            .with_buy("close<=10")
            .with_sell("close>=12");
        let result = run_backtest(&t, &strategy, &BacktestConfig { starting_cash: 100.0 }).unwrap();

        assert_eq!(flag_column(&result, "buy_signal"), vec![1, 1, 1, 0, 0, 1, 1]);
        assert_eq!(flag_column(&result, "sell_signal"), vec![0, 0, 0, 1, 1, 0, 0]);
        assert_eq!(flag_column(&result, "holding_signal"), vec![1, 1, 1, 0, 0, 1, 1]);
        assert_eq!(flag_column(&result, "close<=10"), vec![1, 1, 1, 0, 0, 1, 1]);

        assert_eq!(result.num_trades, 2);
        assert!((result.final_value - 120.0).abs() < 1e-9);
        assert!((result.pct_change - 0.2).abs() < 1e-9);
        assert!((result.win_rate - 0.5).abs() < f64::EPSILON);
        assert!(result.warnings.is_empty());
        assert!((result.baseline.final_value - 80.0).abs() < 1e-9);
    }

    #[test]
    fn warmup_rows_are_trimmed() {
        let t = table(&[1.0, 2.0, 3.0, 4.0])
            .with_column("sma", vec![None, None, Some(2.0), Some(3.0)])
            .unwrap();
        let strategy = Strategy::new("s").with_buy("close > sma");
        let result = run_backtest(&t, &strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.equity_curve.len(), 2);
        assert_eq!(result.baseline.curve.len(), 2);
    }

    #[test]
    fn all_undefined_is_empty_input() {
        let t = table(&[1.0, 2.0])
            .with_column("rsi", vec![None, None])
            .unwrap();
        let err = run_backtest(&t, &Strategy::new("s"), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, SigtraderError::EmptyInput { rows: 2 }));
    }

    #[test]
    fn no_buy_conditions_never_trades() {
        let t = table(&[5.0, 6.0, 7.0]);
        let strategy = Strategy::new("s").with_sell("close > 0");
        let result = run_backtest(&t, &strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(flag_column(&result, "holding_signal"), vec![0, 0, 0]);
        assert_eq!(result.num_trades, 0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.final_value, DEFAULT_STARTING_CASH);
    }

    #[test]
    fn dropped_conditions_become_warnings() {
        let t = table(&[5.0, 6.0]);
        let strategy = Strategy::new("s")
            .with_buy("undefined_signal > 1")
            .with_sell("close >");
        let result = run_backtest(&t, &strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].side, Side::Buy);
        assert_eq!(result.warnings[1].side, Side::Sell);
        assert_eq!(result.num_trades, 0);
    }

    #[test]
    fn input_table_is_untouched() {
        let t = table(&[5.0, 6.0]);
        let before = t.clone();
        let _ = run_backtest(&t, &Strategy::new("s").with_buy("close > 0"), &BacktestConfig::default())
            .unwrap();
        assert_eq!(t, before);
    }
}
