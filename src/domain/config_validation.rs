//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::ohlcv::PriceField;
use crate::domain::strategy::split_conditions;
use crate::ports::config_port::ConfigPort;
use tracing::warn;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_starting_cash(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_buy_conditions(config)?;
    validate_indicators(config)?;
    Ok(())
}

fn validate_starting_cash(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let Some(raw) = config.get_string("backtest", "starting_cash") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(SigtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "starting_cash".to_string(),
            reason: format!("starting_cash must be a positive number, got '{}'", raw),
        }),
    }
}

/// A strategy without buy conditions is valid: it never opens a position.
fn validate_buy_conditions(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let buy = config.get_string("strategy", "buy").unwrap_or_default();
    if split_conditions(&buy).is_empty() {
        warn!("[strategy] has no buy conditions; the run will stay in cash");
    }
    Ok(())
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    for column in config.keys("indicators") {
        validate_column_name(&column)?;
        let raw = config.get_string("indicators", &column).unwrap_or_default();
        raw.parse::<IndicatorKind>()
            .map_err(|source| SigtraderError::IndicatorParse {
                input: raw.clone(),
                source,
            })?;
    }
    Ok(())
}

fn validate_column_name(column: &str) -> Result<(), SigtraderError> {
    let invalid = |reason: String| SigtraderError::ConfigInvalid {
        section: "indicators".to_string(),
        key: column.to_string(),
        reason,
    };

    let mut chars = column.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "column names must be letters, digits and '_', not starting with a digit".to_string(),
        ));
    }
    if PriceField::from_name(column).is_some() {
        return Err(invalid(format!("'{}' is a price field", column)));
    }
    if ["and", "or", "not"].contains(&column) {
        return Err(invalid(format!("'{}' is a reserved word", column)));
    }
    Ok(())
}
