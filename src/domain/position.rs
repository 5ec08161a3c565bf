//! Open position and completed trade records.

use chrono::NaiveDateTime;

/// A fully invested long position.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub shares: f64,
}

impl OpenPosition {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    /// Fractional return if the position were closed at `price`.
    pub fn return_at(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    /// `exit_price / entry_price - 1`.
    pub return_pct: f64,
    /// Closed because the series ended, not by a sell signal.
    pub forced_close: bool,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.return_pct < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_position() -> OpenPosition {
        OpenPosition {
            entry_timestamp: ts(15),
            entry_price: 50.0,
            shares: 2.0,
        }
    }

    #[test]
    fn market_value() {
        let pos = sample_position();
        assert!((pos.market_value(60.0) - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn return_at_price() {
        let pos = sample_position();
        assert!((pos.return_at(60.0) - 0.2).abs() < 1e-12);
        assert!((pos.return_at(40.0) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn trade_classification() {
        let mut trade = ClosedTrade {
            entry_timestamp: ts(1),
            exit_timestamp: ts(5),
            entry_price: 10.0,
            exit_price: 12.0,
            return_pct: 0.2,
            forced_close: false,
        };
        assert!(trade.is_win());
        assert!(!trade.is_loss());

        trade.return_pct = 0.0;
        assert!(!trade.is_win());
        assert!(!trade.is_loss());

        trade.return_pct = -0.1;
        assert!(trade.is_loss());
    }
}
