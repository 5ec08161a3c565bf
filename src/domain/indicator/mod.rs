//! Technical indicator implementations.
//!
//! This module provides:
//! - `IndicatorKind`: closed set of indicators with their parameters
//! - `IndicatorSeries`: one value per bar, `None` marking undefined (warm-up) bars
//! - `IndicatorSpec`: an indicator bound to the column name it is stored under
//!
//! Every calculation is a pure function of the bars and returns a series with
//! exactly one entry per input bar.

pub mod bollinger;
pub mod earnings;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ParseError;
use crate::domain::ohlcv::OhlcvBar;

pub use bollinger::{calculate_bollinger_lower, calculate_bollinger_upper};
pub use earnings::calculate_days_to_earnings;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    BollingerLower(usize),
    BollingerUpper(usize),
    Macd,
    Obv,
    DaysToEarnings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub(crate) fn undefined(kind: IndicatorKind, len: usize) -> Self {
        IndicatorSeries {
            kind,
            values: vec![None; len],
        }
    }

    /// Number of leading bars without a value.
    pub fn warmup(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }
}

/// An indicator bound to the column it will be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub column: String,
    pub kind: IndicatorKind,
}

impl IndicatorSpec {
    pub fn new(column: impl Into<String>, kind: IndicatorKind) -> Self {
        IndicatorSpec {
            column: column.into(),
            kind,
        }
    }
}

impl IndicatorKind {
    /// Compute this indicator over `bars`.
    ///
    /// `earnings_dates` is only consulted by [`IndicatorKind::DaysToEarnings`].
    pub fn compute(&self, bars: &[OhlcvBar], earnings_dates: &[NaiveDate]) -> IndicatorSeries {
        match *self {
            IndicatorKind::Sma(period) => calculate_sma(bars, period),
            IndicatorKind::Ema(period) => calculate_ema(bars, period),
            IndicatorKind::Rsi(period) => calculate_rsi(bars, period),
            IndicatorKind::BollingerLower(period) => calculate_bollinger_lower(bars, period),
            IndicatorKind::BollingerUpper(period) => calculate_bollinger_upper(bars, period),
            IndicatorKind::Macd => calculate_macd(bars),
            IndicatorKind::Obv => calculate_obv(bars),
            IndicatorKind::DaysToEarnings => calculate_days_to_earnings(bars, earnings_dates),
        }
    }

    pub fn needs_earnings_dates(&self) -> bool {
        matches!(self, IndicatorKind::DaysToEarnings)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::BollingerLower(period) => write!(f, "BOLLINGER_LOWER({})", period),
            IndicatorKind::BollingerUpper(period) => write!(f, "BOLLINGER_UPPER({})", period),
            IndicatorKind::Macd => write!(f, "MACD"),
            IndicatorKind::Obv => write!(f, "OBV"),
            IndicatorKind::DaysToEarnings => write!(f, "DAYS_TO_EARNINGS"),
        }
    }
}

impl FromStr for IndicatorKind {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let offset = input.len() - input.trim_start().len();

        let (name, args) = match trimmed.find('(') {
            Some(open) => {
                if !trimmed.ends_with(')') {
                    return Err(ParseError {
                        message: "expected ')'".to_string(),
                        position: offset + trimmed.len(),
                    });
                }
                (
                    trimmed[..open].trim_end(),
                    Some((open + 1, &trimmed[open + 1..trimmed.len() - 1])),
                )
            }
            None => (trimmed, None),
        };

        let period = |args: Option<(usize, &str)>| -> Result<usize, ParseError> {
            let (start, text) = args.ok_or_else(|| ParseError {
                message: format!("{} requires a period, e.g. {}(20)", name, name),
                position: offset + name.len(),
            })?;
            text.trim().parse::<usize>().map_err(|_| ParseError {
                message: format!("invalid period '{}'", text.trim()),
                position: offset + start,
            })
        };

        let no_args = |args: Option<(usize, &str)>, kind: IndicatorKind| match args {
            Some((start, text)) if !text.trim().is_empty() => Err(ParseError {
                message: format!("{} takes no parameters", name),
                position: offset + start,
            }),
            _ => Ok(kind),
        };

        match name.to_ascii_uppercase().as_str() {
            "SMA" => Ok(IndicatorKind::Sma(period(args)?)),
            "EMA" => Ok(IndicatorKind::Ema(period(args)?)),
            "RSI" => Ok(IndicatorKind::Rsi(period(args)?)),
            "BOLLINGER_LOWER" => Ok(IndicatorKind::BollingerLower(period(args)?)),
            "BOLLINGER_UPPER" => Ok(IndicatorKind::BollingerUpper(period(args)?)),
            "MACD" => no_args(args, IndicatorKind::Macd),
            "OBV" => no_args(args, IndicatorKind::Obv),
            "DAYS_TO_EARNINGS" => no_args(args, IndicatorKind::DaysToEarnings),
            _ => Err(ParseError {
                message: format!(
                    "expected indicator (SMA, EMA, RSI, BOLLINGER_LOWER, BOLLINGER_UPPER, MACD, OBV, DAYS_TO_EARNINGS), found '{}'",
                    name
                ),
                position: offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_kind_display() {
        assert_eq!(IndicatorKind::Sma(20).to_string(), "SMA(20)");
        assert_eq!(
            IndicatorKind::BollingerUpper(30).to_string(),
            "BOLLINGER_UPPER(30)"
        );
        assert_eq!(IndicatorKind::Macd.to_string(), "MACD");
    }

    #[test]
    fn parse_all_kinds() {
        assert_eq!("SMA(20)".parse(), Ok(IndicatorKind::Sma(20)));
        assert_eq!("EMA(12)".parse(), Ok(IndicatorKind::Ema(12)));
        assert_eq!("RSI(14)".parse(), Ok(IndicatorKind::Rsi(14)));
        assert_eq!(
            "BOLLINGER_LOWER(30)".parse(),
            Ok(IndicatorKind::BollingerLower(30))
        );
        assert_eq!(
            "BOLLINGER_UPPER(30)".parse(),
            Ok(IndicatorKind::BollingerUpper(30))
        );
        assert_eq!("MACD".parse(), Ok(IndicatorKind::Macd));
        assert_eq!("OBV".parse(), Ok(IndicatorKind::Obv));
        assert_eq!(
            "DAYS_TO_EARNINGS".parse(),
            Ok(IndicatorKind::DaysToEarnings)
        );
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!("  rsi( 14 ) ".parse(), Ok(IndicatorKind::Rsi(14)));
        assert_eq!("macd()".parse(), Ok(IndicatorKind::Macd));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for kind in [
            IndicatorKind::Sma(5),
            IndicatorKind::Ema(9),
            IndicatorKind::Rsi(14),
            IndicatorKind::BollingerLower(20),
            IndicatorKind::BollingerUpper(20),
            IndicatorKind::Macd,
            IndicatorKind::Obv,
            IndicatorKind::DaysToEarnings,
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn error_unknown_indicator() {
        let err = "STOCHASTIC(14)".parse::<IndicatorKind>().unwrap_err();
        assert!(err.message.contains("expected indicator"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn error_missing_period() {
        let err = "SMA".parse::<IndicatorKind>().unwrap_err();
        assert!(err.message.contains("requires a period"));
    }

    #[test]
    fn error_bad_period() {
        let err = "RSI(x)".parse::<IndicatorKind>().unwrap_err();
        assert!(err.message.contains("invalid period"));
        assert_eq!(err.position, 4);
    }

    #[test]
    fn error_missing_close_paren() {
        let err = "EMA(20".parse::<IndicatorKind>().unwrap_err();
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn error_parameters_on_fixed_indicator() {
        let err = "MACD(12,26)".parse::<IndicatorKind>().unwrap_err();
        assert!(err.message.contains("takes no parameters"));
    }

    #[test]
    fn series_warmup_counts_leading_undefined() {
        let series = IndicatorSeries {
            kind: IndicatorKind::Sma(3),
            values: vec![None, None, Some(1.0), None],
        };
        assert_eq!(series.warmup(), 2);
    }
}
