//! Time-indexed numeric sequences.
//!
//! A `TimeSeries` pairs a strictly increasing date index with one optional
//! value per date. `None` marks an undefined point (insufficient history,
//! missing source data, zero volatility) and propagates through every
//! element-wise operation instead of turning into `NaN` or `inf`.

use chrono::NaiveDate;

use super::error::VoltargetError;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Build a series, rejecting mismatched lengths and unsorted or duplicate dates.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Result<Self, VoltargetError> {
        if dates.len() != values.len() {
            return Err(VoltargetError::InvalidIndex {
                reason: format!("{} dates but {} values", dates.len(), values.len()),
            });
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(VoltargetError::InvalidIndex {
                reason: format!("index not strictly increasing at {} -> {}", pair[0], pair[1]),
            });
        }
        Ok(Self { dates, values })
    }

    /// Build a fully defined series.
    pub fn from_values(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, VoltargetError> {
        Self::new(dates, values.into_iter().map(Some).collect())
    }

    /// Internal constructor for series derived from an already validated index.
    pub(crate) fn derived(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Defined values in index order.
    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn defined_count(&self) -> usize {
        self.defined().count()
    }

    /// Index of the first defined point.
    pub fn first_defined_index(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// Apply `f` to every defined point; undefined points stay undefined.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> Option<f64>,
    {
        let values = self.values.iter().map(|v| v.and_then(&f)).collect();
        Self::derived(self.dates.clone(), values)
    }

    /// Combine two series sharing the same index point by point. The result
    /// is undefined wherever either side is.
    pub(crate) fn zip_with<F>(&self, other: &Self, f: F) -> Self
    where
        F: Fn(f64, f64) -> Option<f64>,
    {
        debug_assert_eq!(self.dates, other.dates);
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => f(*a, *b),
                _ => None,
            })
            .collect();
        Self::derived(self.dates.clone(), values)
    }

    /// Lag the values by `periods`: `out[t] = self[t - periods]`, with the
    /// first `periods` points undefined. The index is unchanged.
    pub fn shift(&self, periods: usize) -> Self {
        let lead = periods.min(self.len());
        let values = std::iter::repeat_n(None, lead)
            .chain(self.values.iter().copied().take(self.len() - lead))
            .collect();
        Self::derived(self.dates.clone(), values)
    }

    /// Drop undefined points at both ends. Interior gaps are kept.
    pub fn trim(&self) -> Self {
        let start = match self.values.iter().position(Option::is_some) {
            Some(i) => i,
            None => return Self::derived(Vec::new(), Vec::new()),
        };
        let end = self
            .values
            .iter()
            .rposition(Option::is_some)
            .map_or(start, |i| i + 1);
        Self::derived(
            self.dates[start..end].to_vec(),
            self.values[start..end].to_vec(),
        )
    }

    /// Values with undefined points replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(fill)).collect()
    }

    /// Points with date >= `start` and, when given, <= `end`.
    pub fn between(&self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let (dates, values) = self
            .iter()
            .filter(|(d, _)| *d >= start && end.is_none_or(|e| *d <= e))
            .unzip();
        Self::derived(dates, values)
    }

    /// First `n` points.
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self::derived(self.dates[..n].to_vec(), self.values[..n].to_vec())
    }

    /// Last `n` points.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self::derived(self.dates[start..].to_vec(), self.values[start..].to_vec())
    }

    /// Value at `date`, if the date is on the index and the point is defined.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .and_then(|i| self.values[i])
    }
}
