//! Immutable bar table: OHLCV rows plus named derived columns.
//!
//! Every stage of a run takes a `&BarTable` and returns a new table; nothing is
//! mutated in place, so one loaded table can feed any number of runs.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::ohlcv::{OhlcvBar, PriceField};

/// A derived column: one entry per bar, `None` where the value is undefined.
pub type Column = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct BarTable {
    bars: Vec<OhlcvBar>,
    columns: Vec<(String, Column)>,
}

/// A resolved reference to a column of a specific table.
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'a> {
    Price(PriceField),
    Derived(&'a [Option<f64>]),
}

impl BarTable {
    /// Build a table from bars in strictly increasing timestamp order with
    /// finite, positive closes.
    pub fn from_bars(bars: Vec<OhlcvBar>) -> Result<Self, SigtraderError> {
        for (row, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(SigtraderError::Data {
                    reason: format!(
                        "row {} ({}): close must be a positive number, got {}",
                        row, bar.timestamp, bar.close
                    ),
                });
            }
            if row > 0 && bar.timestamp <= bars[row - 1].timestamp {
                return Err(SigtraderError::UnorderedBars {
                    row,
                    timestamp: bar.timestamp,
                    previous: bars[row - 1].timestamp,
                });
            }
        }

        Ok(BarTable {
            bars,
            columns: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    /// Derived columns in the order they were attached.
    pub fn derived_columns(&self) -> &[(String, Column)] {
        &self.columns
    }

    pub fn derived(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Resolve a price field or derived column by name.
    pub fn column_ref(&self, name: &str) -> Option<ColumnRef<'_>> {
        match PriceField::from_name(name) {
            Some(field) => Some(ColumnRef::Price(field)),
            None => self.derived(name).map(ColumnRef::Derived),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_ref(name).is_some()
    }

    /// Values of a price field or derived column, one per bar.
    pub fn column(&self, name: &str) -> Option<Column> {
        self.column_ref(name).map(|r| match r {
            ColumnRef::Price(field) => self.bars.iter().map(|b| Some(field.value(b))).collect(),
            ColumnRef::Derived(values) => values.to_vec(),
        })
    }

    /// Return a new table with `values` stored under `name`, replacing any
    /// derived column of the same name.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Column,
    ) -> Result<BarTable, SigtraderError> {
        let name = name.into();
        if PriceField::from_name(&name).is_some() {
            return Err(SigtraderError::Data {
                reason: format!("column '{}' would shadow a price field", name),
            });
        }
        if values.len() != self.bars.len() {
            return Err(SigtraderError::ColumnLength {
                name,
                len: values.len(),
                rows: self.bars.len(),
            });
        }

        let mut next = self.clone();
        match next.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => next.columns.push((name, values)),
        }
        Ok(next)
    }

    /// Return a new table with the indicator computed and attached.
    pub fn with_indicator(
        &self,
        spec: &IndicatorSpec,
        earnings_dates: &[NaiveDate],
    ) -> Result<BarTable, SigtraderError> {
        let series = spec.kind.compute(&self.bars, earnings_dates);
        debug!(
            column = %spec.column,
            indicator = %spec.kind,
            warmup = series.warmup(),
            "computed indicator"
        );
        self.with_column(spec.column.clone(), series.values)
    }

    pub fn with_indicators(
        &self,
        specs: &[IndicatorSpec],
        earnings_dates: &[NaiveDate],
    ) -> Result<BarTable, SigtraderError> {
        specs.iter().try_fold(self.clone(), |table, spec| {
            table.with_indicator(spec, earnings_dates)
        })
    }

    /// Return a new table without the leading rows on which any derived column
    /// is undefined. The result may be empty.
    pub fn trim_undefined_leading_rows(&self) -> BarTable {
        let first_complete = (0..self.bars.len())
            .find(|&row| self.columns.iter().all(|(_, values)| values[row].is_some()))
            .unwrap_or(self.bars.len());

        BarTable {
            bars: self.bars[first_complete..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[first_complete..].to_vec()))
                .collect(),
        }
    }
}

impl ColumnRef<'_> {
    pub fn get(&self, bars: &[OhlcvBar], row: usize) -> Option<f64> {
        match self {
            ColumnRef::Price(field) => bars.get(row).map(|b| field.value(b)),
            ColumnRef::Derived(values) => values.get(row).copied().flatten(),
        }
    }
}
