//! CSV report adapter: writes the annotated bar table for charting.

use crate::domain::backtest::PerformanceResult;
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceField;
use crate::ports::report_port::ReportPort;
use std::io;
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn write_to<W: io::Write>(result: &PerformanceResult, out: W) -> Result<(), SigtraderError> {
        let table = &result.table;
        let mut wtr = csv::Writer::from_writer(out);

        let mut header = vec!["timestamp".to_string()];
        header.extend(PriceField::ALL.iter().map(|f| f.name().to_string()));
        header.extend(table.derived_columns().iter().map(|(name, _)| name.clone()));
        wtr.write_record(&header).map_err(io::Error::from)?;

        for (row, bar) in table.bars().iter().enumerate() {
            let mut record = vec![bar.timestamp.format(TIMESTAMP_FORMAT).to_string()];
            record.extend(PriceField::ALL.iter().map(|f| f.value(bar).to_string()));
            record.extend(
                table
                    .derived_columns()
                    .iter()
                    .map(|(_, values)| values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record).map_err(io::Error::from)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &PerformanceResult, output_path: &Path) -> Result<(), SigtraderError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_to(result, io::BufWriter::new(file))?;
        info!(path = %output_path.display(), rows = result.table.len(), "wrote report");
        Ok(())
    }
}
