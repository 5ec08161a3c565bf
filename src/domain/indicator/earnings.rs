//! Days until the next earnings report.
//!
//! For each bar, the next earnings date is the first known date on or after the
//! bar's calendar date. Past the last known date, the next report is assumed to
//! fall 90 days after it. The value is the whole number of days between the
//! bar's date and that next date.
//!
//! With no known earnings dates every bar is undefined.

use chrono::{Duration, NaiveDate};

use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;

pub const ASSUMED_REPORT_INTERVAL_DAYS: i64 = 90;

pub fn calculate_days_to_earnings(bars: &[OhlcvBar], earnings_dates: &[NaiveDate]) -> IndicatorSeries {
    let kind = IndicatorKind::DaysToEarnings;
    let mut dates = earnings_dates.to_vec();
    dates.sort_unstable();
    dates.dedup();

    let Some(&last) = dates.last() else {
        return IndicatorSeries::undefined(kind, bars.len());
    };
    let fallback = last + Duration::days(ASSUMED_REPORT_INTERVAL_DAYS);

    let values = bars
        .iter()
        .map(|bar| {
            let date = bar.timestamp.date();
            let idx = dates.partition_point(|d| *d < date);
            let next = dates.get(idx).copied().unwrap_or(fallback);
            Some((next - date).num_days() as f64)
        })
        .collect();

    IndicatorSeries { kind, values }
}
