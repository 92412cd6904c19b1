//! Price feed port trait.

use crate::domain::error::VoltargetError;
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;

pub trait PriceFeed {
    /// Daily closes for `symbol` from `start_date` through `end_date` (open
    /// ended when `None`). Gaps in the source come back as undefined points.
    /// A source that cannot be read or holds no rows is `DataUnavailable`.
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, VoltargetError>;

    /// First date, last date and row count available for `symbol`.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError>;
}
