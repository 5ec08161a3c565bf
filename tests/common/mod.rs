#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sigtrader::domain::bar_table::BarTable;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::strategy::Strategy;
use sigtrader::ports::data_port::DataPort;
use std::io::Write;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub earnings: Vec<NaiveDate>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            earnings: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<OhlcvBar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_earnings(mut self, dates: Vec<NaiveDate>) -> Self {
        self.earnings = dates;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_table(&self) -> Result<BarTable, SigtraderError> {
        if let Some(reason) = &self.error {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        BarTable::from_bars(self.bars.clone())
    }

    fn fetch_earnings_dates(&self) -> Result<Vec<NaiveDate>, SigtraderError> {
        Ok(self.earnings.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(0, 0, 0).unwrap()
}

/// One bar per day from 2024-01-01, open/high/low around the close.
pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            timestamp: midnight(start + chrono::Duration::days(i as i64)),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.01),
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn make_table(closes: &[f64]) -> BarTable {
    BarTable::from_bars(make_bars(closes)).unwrap()
}

pub fn scenario_closes() -> Vec<f64> {
    vec![10.0, 10.0, 10.0, 12.0, 12.0, 8.0, 8.0]
}

pub fn scenario_strategy() -> Strategy {
    Strategy::new("Threshold")
        .with_buy("close <= 10")
        .with_sell("close >= 12")
}

/// A price CSV body with a lower-case header, one row per close.
pub fn price_csv(closes: &[f64]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for bar in make_bars(closes) {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// `ExitCode` has no `PartialEq`; compare through its debug form.
pub fn exit_code_is(code: std::process::ExitCode, expected: u8) -> bool {
    format!("{:?}", code) == format!("{:?}", std::process::ExitCode::from(expected))
}
