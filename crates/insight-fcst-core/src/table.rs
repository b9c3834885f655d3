//! Rectangular tabular input parsed from CSV.

use std::io::Read;

use serde::Serialize;

use crate::error::{InsightError, Result};

/// A rectangular table of string cells with named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Column names and leading rows of a table, for column selection in a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub head_rows: Vec<Vec<String>>,
    /// Total number of data rows in the table
    pub rows: usize,
}

impl Table {
    /// Build a table from headers and rows.
    ///
    /// Short rows are padded with empty cells; rows wider than the header are rejected.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(InsightError::InvalidCsv("No columns to parse".to_string()));
        }

        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(InsightError::InvalidCsv(format!(
                    "Expected {} fields in row {}, saw {}",
                    width,
                    i + 1,
                    row.len()
                )));
            }
            row.resize(width, String::new());
            padded.push(row);
        }

        Ok(Self {
            headers,
            rows: padded,
        })
    }

    /// Parse a CSV document with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(InsightError::InvalidCsv("No columns to parse".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        Self::new(headers, rows)
    }

    /// Parse a CSV document held in memory.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of the named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InsightError::ColumnNotFound {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    /// Cells of the named column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// Preview the first `limit` rows of a table.
pub fn preview(table: &Table, limit: usize) -> TablePreview {
    TablePreview {
        columns: table.headers.clone(),
        head_rows: table.rows.iter().take(limit).cloned().collect(),
        rows: table.n_rows(),
    }
}
