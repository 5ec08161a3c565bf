//! Data access port trait.

use crate::domain::bar_table::BarTable;
use crate::domain::error::SigtraderError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars in timestamp order, with any pre-computed columns attached.
    fn fetch_table(&self) -> Result<BarTable, SigtraderError>;

    /// Known earnings report dates. Empty when none are available.
    fn fetch_earnings_dates(&self) -> Result<Vec<NaiveDate>, SigtraderError>;
}
