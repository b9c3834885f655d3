//! Normalization of raw tabular input into a canonical [`TimeSeries`].
//!
//! Rows whose date or value cannot be parsed are dropped. Duplicate dates are
//! resolved by input row order: the last row seen for a date wins, regardless
//! of where that date lands after sorting.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::Result;
use crate::series::TimeSeries;
use crate::table::Table;

/// Date-only layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Date-time layouts; the time of day is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Row accounting produced while normalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Rows in the input table
    pub input_rows: usize,
    /// Rows dropped for a missing or unparseable date or value
    pub dropped: usize,
    /// Rows discarded because a later row carried the same date
    pub deduped: usize,
}

/// Parse a date cell. Returns `None` for anything unrecognized.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// Parse a numeric cell. NaN, infinities and blanks count as missing.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize the named columns of `table` into a [`TimeSeries`].
///
/// Fails with `ColumnNotFound` when either column is absent.
pub fn normalize(table: &Table, date_col: &str, value_col: &str) -> Result<TimeSeries> {
    normalize_with_report(table, date_col, value_col).map(|(series, _)| series)
}

/// Like [`normalize`], also returning how many rows were dropped or deduplicated.
pub fn normalize_with_report(
    table: &Table,
    date_col: &str,
    value_col: &str,
) -> Result<(TimeSeries, NormalizeReport)> {
    let dates = table.column(date_col)?;
    let values = table.column(value_col)?;

    let mut report = NormalizeReport {
        input_rows: table.n_rows(),
        ..Default::default()
    };

    // BTreeMap keeps keys ascending; inserting in row order makes the last row win.
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (raw_date, raw_value) in dates.iter().zip(values.iter()) {
        match (parse_date(raw_date), parse_value(raw_value)) {
            (Some(date), Some(value)) => {
                if by_date.insert(date, value).is_some() {
                    report.deduped += 1;
                }
            }
            _ => report.dropped += 1,
        }
    }

    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = by_date.into_iter().unzip();
    Ok((TimeSeries::from_sorted_unchecked(dates, values), report))
}

/// Render a series back into a two-column table (`ds`, `y`).
pub fn to_table(series: &TimeSeries) -> Result<Table> {
    let rows = series
        .iter()
        .map(|(date, value)| vec![date.format("%Y-%m-%d").to_string(), value.to_string()])
        .collect();
    Table::new(vec!["ds".to_string(), "y".to_string()], rows)
}
