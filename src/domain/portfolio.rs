//! Single-asset, all-in or all-cash portfolio simulation.

use chrono::NaiveDateTime;

use super::ohlcv::OhlcvBar;
use super::position::{ClosedTrade, OpenPosition};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<OpenPosition>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.position.is_some()
    }

    /// Convert all cash to shares at the bar's close. No-op when already holding.
    pub fn open(&mut self, bar: &OhlcvBar) {
        if self.position.is_some() {
            return;
        }
        self.position = Some(OpenPosition {
            entry_timestamp: bar.timestamp,
            entry_price: bar.close,
            shares: self.cash / bar.close,
        });
        self.cash = 0.0;
    }

    /// Convert all shares back to cash at the bar's close and record the trade.
    pub fn close(&mut self, bar: &OhlcvBar, forced_close: bool) {
        let Some(position) = self.position.take() else {
            return;
        };
        self.cash = position.market_value(bar.close);
        self.record_trade(ClosedTrade {
            entry_timestamp: position.entry_timestamp,
            exit_timestamp: bar.timestamp,
            entry_price: position.entry_price,
            exit_price: bar.close,
            return_pct: position.return_at(bar.close),
            forced_close,
        });
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, value: f64) {
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Mark-to-market value at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }
}

/// Walk the holding column against the bars' closes.
///
/// A position still open on the last bar is force-closed at its close.
pub fn simulate(bars: &[OhlcvBar], holding: &[bool], starting_cash: f64) -> Portfolio {
    let mut portfolio = Portfolio::new(starting_cash);

    for (bar, &hold) in bars.iter().zip(holding) {
        match (portfolio.is_holding(), hold) {
            (false, true) => portfolio.open(bar),
            (true, false) => portfolio.close(bar, false),
            _ => {}
        }
        portfolio.record_equity(bar.timestamp, portfolio.total_value(bar.close));
    }

    if let Some(last) = bars.last() {
        portfolio.close(last, true);
    }

    portfolio
}
