//! CSV file data adapter.
//!
//! Reads a headed price file with a time column (`timestamp`, `date` or
//! `datetime`) and `open,high,low,close,volume`. Header names are matched
//! case-insensitively with spaces read as `_`. Any further numeric column is
//! attached to the table as a pre-computed column, empty cells meaning
//! undefined.

use crate::domain::bar_table::{BarTable, Column};
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TIME_COLUMNS: [&str; 3] = ["timestamp", "date", "datetime"];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

pub struct CsvAdapter {
    data_path: PathBuf,
    earnings_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(data_path: PathBuf, earnings_path: Option<PathBuf>) -> Self {
        Self {
            data_path,
            earnings_path,
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_table(&self) -> Result<BarTable, SigtraderError> {
        let content = read_file(&self.data_path)?;
        let table = parse_price_csv(&content)?;
        debug!(
            path = %self.data_path.display(),
            rows = table.len(),
            columns = table.derived_columns().len(),
            "loaded price data"
        );
        Ok(table)
    }

    fn fetch_earnings_dates(&self) -> Result<Vec<NaiveDate>, SigtraderError> {
        match &self.earnings_path {
            Some(path) => parse_earnings_csv(&read_file(path)?),
            None => Ok(Vec::new()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, SigtraderError> {
    fs::read_to_string(path).map_err(|e| SigtraderError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Parse a timestamp in any of the accepted forms. A UTC offset is dropped,
/// keeping the wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.naive_local())
        })
}

fn parse_cell(value: &str, row: usize, column: &str) -> Result<Option<f64>, SigtraderError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| SigtraderError::Data {
            reason: format!("row {}: invalid {} value '{}': {}", row, column, value, e),
        })
}

fn csv_error(e: csv::Error) -> SigtraderError {
    SigtraderError::Data {
        reason: format!("CSV parse error: {}", e),
    }
}

pub fn parse_price_csv(content: &str) -> Result<BarTable, SigtraderError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(normalize_header)
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let missing = |name: &str| SigtraderError::Data {
        reason: format!("missing {} column", name),
    };

    let time_idx = TIME_COLUMNS
        .iter()
        .find_map(|&name| find(name))
        .ok_or_else(|| missing("timestamp/date"))?;
    let mut price_idx = [0usize; 5];
    for (slot, field) in price_idx.iter_mut().zip(PriceField::ALL) {
        *slot = find(field.name()).ok_or_else(|| missing(field.name()))?;
    }

    let extra: Vec<usize> = (0..headers.len())
        .filter(|i| *i != time_idx && !price_idx.contains(i))
        .filter(|i| !headers[*i].is_empty())
        .collect();

    let mut bars = Vec::new();
    let mut extra_values: Vec<Column> = vec![Vec::new(); extra.len()];
    let mut extra_ok = vec![true; extra.len()];

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let raw_time = cell(time_idx);
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| SigtraderError::Data {
            reason: format!("row {}: invalid timestamp '{}'", row, raw_time),
        })?;

        let mut prices = [0.0_f64; 5];
        for ((value, &idx), field) in prices.iter_mut().zip(&price_idx).zip(PriceField::ALL) {
            *value = parse_cell(cell(idx), row, field.name())?.ok_or_else(|| {
                SigtraderError::Data {
                    reason: format!("row {}: empty {} value", row, field.name()),
                }
            })?;
            if !value.is_finite() {
                return Err(SigtraderError::Data {
                    reason: format!("row {}: {} must be finite, got {}", row, field.name(), value),
                });
            }
        }

        bars.push(OhlcvBar {
            timestamp,
            open: prices[0],
            high: prices[1],
            low: prices[2],
            close: prices[3],
            volume: prices[4],
        });

        for (slot, &idx) in extra.iter().enumerate() {
            if !extra_ok[slot] {
                continue;
            }
            match parse_cell(cell(idx), row, &headers[idx]) {
                // NaN and infinities are undefined, like an empty cell.
                Ok(v) => extra_values[slot].push(v.filter(|x| x.is_finite())),
                Err(_) => {
                    warn!(column = %headers[idx], row, "skipping non-numeric column");
                    extra_ok[slot] = false;
                }
            }
        }
    }

    let mut table = BarTable::from_bars(bars)?;
    for ((idx, values), ok) in extra.into_iter().zip(extra_values).zip(extra_ok) {
        if ok {
            table = table.with_column(headers[idx].clone(), values)?;
        }
    }
    Ok(table)
}

/// One date per row in the first column, after a header row.
pub fn parse_earnings_csv(content: &str) -> Result<Vec<NaiveDate>, SigtraderError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut dates = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let raw = record.get(0).unwrap_or("").trim();
        if raw.is_empty() {
            continue;
        }
        let ts = parse_timestamp(raw).ok_or_else(|| SigtraderError::Data {
            reason: format!("earnings row {}: invalid date '{}'", row, raw),
        })?;
        dates.push(ts.date());
    }

    dates.sort();
    dates.dedup();
    Ok(dates)
}
