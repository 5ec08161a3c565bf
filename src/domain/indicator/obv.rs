//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

/// Calculate OBV (On-Balance Volume).
///
/// OBV[0] = 0
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; all bars are defined.
pub fn calculate_obv(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut obv: f64 = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                obv += bar.volume;
            } else if bar.close < prev_close {
                obv -= bar.volume;
            }
        }
        values.push(Some(obv));
    }

    IndicatorSeries {
        kind: IndicatorKind::Obv,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, close: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn obv_seeded_at_zero() {
        let series = calculate_obv(&[make_bar(1, 10.0, 500.0)]);
        assert_eq!(series.values, vec![Some(0.0)]);
    }

    #[test]
    fn obv_up_down_flat() {
        let bars = vec![
            make_bar(1, 10.0, 100.0),
            make_bar(2, 11.0, 200.0),
            make_bar(3, 10.5, 50.0),
            make_bar(4, 10.5, 999.0),
            make_bar(5, 12.0, 25.0),
        ];
        let series = calculate_obv(&bars);
        assert_eq!(
            series.values,
            vec![Some(0.0), Some(200.0), Some(150.0), Some(150.0), Some(175.0)]
        );
    }

    #[test]
    fn obv_empty() {
        let series = calculate_obv(&[]);
        assert!(series.values.is_empty());
        assert_eq!(series.kind, IndicatorKind::Obv);
    }
}
