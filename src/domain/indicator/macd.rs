//! MACD (Moving Average Convergence Divergence) line.
//!
//! MACD = EMA(12) - EMA(26), both seeded from the first close, so the line is
//! defined from bar 0 and carries the same startup bias as [`super::ema`].
//! The spans are fixed.

use crate::domain::indicator::ema::ema_raw_values;
use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

pub const FAST_SPAN: usize = 12;
pub const SLOW_SPAN: usize = 26;

pub fn calculate_macd(bars: &[OhlcvBar]) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast = ema_raw_values(&closes, FAST_SPAN);
    let slow = ema_raw_values(&closes, SLOW_SPAN);

    IndicatorSeries {
        kind: IndicatorKind::Macd,
        values: fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some(f - s))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_ema;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn macd_is_fast_minus_slow_ema() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = make_bars(&prices);

        let macd = calculate_macd(&bars);
        let fast = calculate_ema(&bars, 12);
        let slow = calculate_ema(&bars, 26);

        for i in 0..bars.len() {
            let expected = fast.values[i].unwrap() - slow.values[i].unwrap();
            assert_eq!(macd.values[i], Some(expected));
        }
    }

    #[test]
    fn macd_starts_at_zero() {
        let bars = make_bars(&[50.0, 51.0, 52.0]);
        let macd = calculate_macd(&bars);
        assert_eq!(macd.values[0], Some(0.0));
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let macd = calculate_macd(&make_bars(&prices));
        assert!(macd.values[29].unwrap() > 0.0);
    }

    #[test]
    fn macd_flat_prices_is_zero() {
        let macd = calculate_macd(&make_bars(&[42.0; 10]));
        for v in &macd.values {
            approx::assert_abs_diff_eq!(v.unwrap(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn macd_empty() {
        let macd = calculate_macd(&[]);
        assert!(macd.values.is_empty());
        assert_eq!(macd.kind, IndicatorKind::Macd);
    }
}
