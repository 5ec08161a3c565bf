//! Buy-and-hold reference curve.

use super::ohlcv::OhlcvBar;
use super::portfolio::EquityPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub final_value: f64,
    pub pct_change: f64,
    /// 1.0 if the final change is non-negative, else 0.0. Not a trade statistic.
    pub win_rate: f64,
    pub num_trades: usize,
    pub curve: Vec<EquityPoint>,
}

/// Invest `starting_cash` at the first close and hold to the end.
pub fn buy_and_hold(bars: &[OhlcvBar], starting_cash: f64) -> Baseline {
    let Some(first) = bars.first() else {
        return Baseline {
            final_value: starting_cash,
            pct_change: 0.0,
            win_rate: 0.0,
            num_trades: 0,
            curve: Vec::new(),
        };
    };

    let shares = starting_cash / first.close;
    let curve: Vec<EquityPoint> = bars
        .iter()
        .map(|bar| EquityPoint {
            timestamp: bar.timestamp,
            value: shares * bar.close,
        })
        .collect();

    let final_value = curve.last().map_or(starting_cash, |p| p.value);
    let pct_change = final_value / starting_cash - 1.0;

    Baseline {
        final_value,
        pct_change,
        win_rate: if pct_change >= 0.0 { 1.0 } else { 0.0 },
        num_trades: 1,
        curve,
    }
}
