//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::VoltargetError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// `Ok(None)` when the key is absent, `ConfigInvalid` when it is not a
    /// `YYYY-MM-DD` date.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, VoltargetError> {
        match self.get_string(section, key).filter(|s| !s.trim().is_empty()) {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map(Some)
                .map_err(|_| {
                    VoltargetError::invalid(
                        section,
                        key,
                        format!("invalid {key} format, expected YYYY-MM-DD"),
                    )
                }),
        }
    }
}
