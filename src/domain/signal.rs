//! Buy/sell signal aggregation.
//!
//! A group's signal is the conjunction of every condition in it that
//! evaluated successfully. Conditions that fail are dropped with a warning.

use std::fmt;

use tracing::{debug, warn};

use crate::domain::bar_table::BarTable;
use crate::domain::condition::evaluate_condition;
use crate::domain::error::ConditionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Name of the annotated signal column for this side.
    pub fn column(self) -> &'static str {
        match self {
            Side::Buy => "buy_signal",
            Side::Sell => "sell_signal",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A condition dropped from a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionWarning {
    pub side: Side,
    pub condition: String,
    pub error: ConditionError,
}

impl fmt::Display for ConditionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} condition '{}' dropped: {}",
            self.side, self.condition, self.error
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSignal {
    pub side: Side,
    pub signal: Vec<bool>,
    /// Conditions that evaluated, in input order, with their per-bar values.
    pub accepted: Vec<(String, Vec<bool>)>,
    pub warnings: Vec<ConditionWarning>,
}

/// Evaluate every condition of one group and AND the survivors together.
///
/// With no surviving condition the signal is false on every bar.
pub fn aggregate(side: Side, conditions: &[String], table: &BarTable) -> AggregatedSignal {
    let mut accepted = Vec::new();
    let mut warnings = Vec::new();

    for condition in conditions {
        match evaluate_condition(condition, table) {
            Ok(values) => {
                debug!(%side, condition = %condition, "condition accepted");
                accepted.push((condition.clone(), values));
            }
            Err(error) => {
                warn!(%side, condition = %condition, %error, "dropping condition");
                warnings.push(ConditionWarning {
                    side,
                    condition: condition.clone(),
                    error,
                });
            }
        }
    }

    let signal = if accepted.is_empty() {
        vec![false; table.len()]
    } else {
        accepted
            .iter()
            .fold(vec![true; table.len()], |acc, (_, values)| {
                acc.into_iter().zip(values).map(|(a, &b)| a && b).collect()
            })
    };

    AggregatedSignal {
        side,
        signal,
        accepted,
        warnings,
    }
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
                volume: 10.0,
            })
            .collect();
        BarTable::from_bars(bars).unwrap()
    }

    fn conds(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_group_is_all_false() {
        let t = table(&[1.0, 2.0, 3.0]);
        let agg = aggregate(Side::Buy, &[], &t);
        assert_eq!(agg.signal, vec![false, false, false]);
        assert!(agg.accepted.is_empty());
        assert!(agg.warnings.is_empty());
    }

    #[test]
    fn single_condition_passes_through() {
        let t = table(&[1.0, 2.0, 3.0]);
        let agg = aggregate(Side::Sell, &conds(&["close >= 2"]), &t);
        assert_eq!(agg.signal, vec![false, true, true]);
        assert_eq!(agg.accepted.len(), 1);
    }

    #[test]
    fn conditions_are_conjunctive() {
        let t = table(&[1.0, 2.0, 3.0, 4.0]);
        let agg = aggregate(Side::Buy, &conds(&["close >= 2", "close <= 3"]), &t);
        assert_eq!(agg.signal, vec![false, true, true, false]);
    }

    #[test]
    fn failing_condition_is_dropped_with_warning() {
        let t = table(&[1.0, 2.0, 3.0]);
        let agg = aggregate(
            Side::Buy,
            &conds(&["close >= 2", "undefined_signal > 0", "close >"]),
            &t,
        );
        assert_eq!(agg.signal, vec![false, true, true]);
        assert_eq!(agg.accepted.len(), 1);
        assert_eq!(agg.warnings.len(), 2);
        assert_eq!(agg.warnings[0].condition, "undefined_signal > 0");
        assert!(matches!(
            agg.warnings[0].error,
            ConditionError::MissingColumn { .. }
        ));
        assert!(matches!(agg.warnings[1].error, ConditionError::Parse(_)));
    }

    #[test]
    fn all_conditions_failing_is_all_false() {
        let t = table(&[1.0, 2.0]);
        let agg = aggregate(Side::Buy, &conds(&["nope > 1"]), &t);
        assert_eq!(agg.signal, vec![false, false]);
        assert_eq!(agg.warnings.len(), 1);
    }

    #[test]
    fn warning_display() {
        let t = table(&[1.0]);
        let agg = aggregate(Side::Sell, &conds(&["missing < 3"]), &t);
        assert_eq!(
            agg.warnings[0].to_string(),
            "sell condition 'missing < 3' dropped: unknown column 'missing'"
        );
    }
}
