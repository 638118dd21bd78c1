//! Raw tabular input as read from an uploaded file

use crate::error::{BioflowError, Result};

/// Field values read as missing, the usual spreadsheet and dataframe NA spellings
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single raw cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Build a cell from a raw field, mapping NA tokens to `Missing`
    pub fn from_raw(field: &str) -> Self {
        if NA_TOKENS.contains(&field) {
            Cell::Missing
        } else {
            Cell::Text(field.to_string())
        }
    }

    /// `Missing` and NaN numbers both count as missing
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(x) => x.is_nan(),
            Cell::Text(_) => false,
        }
    }

    /// Coerce to a number. Missing, unparseable and NaN values all give `None`.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Missing => return None,
            Cell::Number(x) => *x,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// Whether a strict numeric conversion of this cell would succeed.
    /// Missing cells convert (to NaN), so they are never an issue.
    pub fn is_numeric_convertible(&self) -> bool {
        match self {
            Cell::Missing | Cell::Number(_) => true,
            Cell::Text(s) => {
                let s = s.trim();
                s.is_empty() || s.parse::<f64>().is_ok()
            }
        }
    }

    /// Text form used for gene identifiers
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number(x) if x.is_nan() => None,
            Cell::Number(x) => Some(x.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Number(x)
    }
}

/// Row-oriented table with string headers.
/// Every row has exactly as many cells as there are columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table, checking that every row matches the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let width = columns.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(BioflowError::InvalidTable {
                reason: format!("Row {} has {} cells, expected {}", i + 1, row.len(), width),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from raw text fields, applying the NA token rules
    pub fn from_text_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|f| Cell::from_raw(f)).collect())
                .collect(),
        )
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Get the number of data rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no data rows (header-only tables included)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of a named column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keep only the given column indices, in the given order
    pub(crate) fn select(&self, indices: &[usize], names: Vec<String>) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table { columns: names, rows }
    }
}
