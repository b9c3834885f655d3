//! Canonical daily time series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// A single `(date, value)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered series with strictly increasing dates and finite values.
///
/// Constructed by the normalizer (or [`TimeSeries::from_pairs`]) and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from pairs that are already in canonical order.
    pub fn from_pairs(pairs: Vec<(NaiveDate, f64)>) -> Result<Self> {
        for (i, w) in pairs.windows(2).enumerate() {
            if w[1].0 <= w[0].0 {
                return Err(InsightError::InvalidInput(format!(
                    "Dates must be strictly increasing: {} at position {} follows {}",
                    w[1].0,
                    i + 1,
                    w[0].0
                )));
            }
        }
        if let Some((date, value)) = pairs.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InsightError::InvalidInput(format!(
                "Non-finite value {} at {}",
                value, date
            )));
        }

        let (dates, values) = pairs.into_iter().unzip();
        Ok(Self { dates, values })
    }

    pub(crate) fn from_sorted_unchecked(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
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

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Observations in date order.
    pub fn observations(&self) -> Vec<Observation> {
        self.iter()
            .map(|(date, value)| Observation { date, value })
            .collect()
    }
}
