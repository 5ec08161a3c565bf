//! RSI (Relative Strength Index) indicator.
//!
//! Bar-over-bar close differences are split into gains and losses, each smoothed
//! with an exponentially weighted mean using alpha = 1/n. The mean is the
//! bias-adjusted form: weights (1-alpha)^k normalised by their sum, carried as a
//! running numerator/denominator pair.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100 (saturated, not an error).
//! If both averages are 0 (flat prices): undefined.
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

/// Running bias-adjusted exponentially weighted mean.
#[derive(Debug, Clone, Copy)]
struct WeightedMean {
    decay: f64,
    numerator: f64,
    denominator: f64,
}

impl WeightedMean {
    fn new(alpha: f64) -> Self {
        WeightedMean {
            decay: 1.0 - alpha,
            numerator: 0.0,
            denominator: 0.0,
        }
    }

    fn push(&mut self, value: f64) -> f64 {
        self.numerator = value + self.decay * self.numerator;
        self.denominator = 1.0 + self.decay * self.denominator;
        self.numerator / self.denominator
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Rsi(period);
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::undefined(kind, bars.len());
    }

    let alpha = 1.0 / period as f64;
    let mut gains = WeightedMean::new(alpha);
    let mut losses = WeightedMean::new(alpha);

    let mut values = Vec::with_capacity(bars.len());
    values.push(None);

    for (i, pair) in bars.windows(2).enumerate() {
        let change = pair[1].close - pair[0].close;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        let avg_gain = gains.push(gain);
        let avg_loss = losses.push(loss);

        let observations = i + 1;
        if observations < period {
            values.push(None);
        } else {
            values.push(rsi_from_averages(avg_gain, avg_loss));
        }
    }

    IndicatorSeries { kind, values }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { Some(100.0) } else { None }
    } else {
        Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
    }
}
