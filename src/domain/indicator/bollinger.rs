//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the sample standard deviation (divides by n-1), so a window of
//! one bar has no defined band. k is fixed at 2.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

pub const STDDEV_MULTIPLIER: f64 = 2.0;

pub fn calculate_bollinger_lower(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        kind: IndicatorKind::BollingerLower(period),
        values: band(bars, period, -STDDEV_MULTIPLIER),
    }
}

pub fn calculate_bollinger_upper(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        kind: IndicatorKind::BollingerUpper(period),
        values: band(bars, period, STDDEV_MULTIPLIER),
    }
}

fn band(bars: &[OhlcvBar], period: usize, mult: f64) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];

            let middle: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let variance: f64 = window
                .iter()
                .map(|b| {
                    let diff = b.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / (period - 1) as f64;

            Some(middle + mult * variance.sqrt())
        })
        .collect()
}
