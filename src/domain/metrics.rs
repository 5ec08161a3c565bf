//! Performance metrics over a simulated portfolio.

use super::portfolio::{EquityPoint, Portfolio};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub num_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Fraction of trades with a positive return, 0 when there are no trades.
    pub win_rate: f64,
    pub avg_trade_return: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio) -> Self {
        let trades = &portfolio.closed_trades;
        let initial_capital = portfolio.initial_capital;

        // Runs always end flat, so settled cash is the final value.
        let total_return = if initial_capital > 0.0 {
            portfolio.cash / initial_capital - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_return_pct = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let r = trade.return_pct;
            total_return_pct += r;
            if trade.is_win() {
                trades_won += 1;
                largest_win = largest_win.max(r);
            } else if trade.is_loss() {
                trades_lost += 1;
                largest_loss = largest_loss.max(r.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let num_trades = trades.len();
        let (win_rate, avg_trade_return) = if num_trades > 0 {
            (
                trades_won as f64 / num_trades as f64,
                total_return_pct / num_trades as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Metrics {
            total_return,
            max_drawdown,
            max_drawdown_duration,
            num_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            avg_trade_return,
            largest_win,
            largest_loss,
        }
    }
}

/// Largest peak-to-trough fall as a fraction of the peak, and the longest run
/// of bars spent below a previous peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.value >= peak {
            peak = point.value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}
