//! Validation report for uploaded tables
//!
//! Validation documents problems without changing the data. The only hard
//! stop a caller must honour is a non-empty `missing_columns` list, see
//! [`ValidationReport::ensure_columns`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::{CanonicalColumn, Table};
use crate::error::{BioflowError, Result};
use crate::normalization::normalize;

/// Summary of what is wrong (or right) with a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of data rows
    pub row_count: usize,
    /// Missing-cell count for every column of the normalized table, in column order.
    /// Serialized as a column -> count object.
    #[serde(with = "column_counts")]
    pub na_counts: Vec<(String, usize)>,
    /// Canonical columns absent after normalization
    pub missing_columns: Vec<CanonicalColumn>,
    /// True if ctrl or treat holds at least one non-numeric value
    pub numeric_issue: bool,
}

/// Ordered (column, count) pairs as a map, keeping column order
mod column_counts {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        counts: &[(String, usize)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(counts.iter().map(|(column, n)| (column, n)))
    }

    struct CountsVisitor;

    impl<'de> Visitor<'de> for CountsVisitor {
        type Value = Vec<(String, usize)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of column names to missing-cell counts")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut counts = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                counts.push(entry);
            }
            Ok(counts)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, usize)>, D::Error> {
        deserializer.deserialize_map(CountsVisitor)
    }
}

impl ValidationReport {
    /// Missing-cell count of a column, if it exists
    pub fn na_count(&self, column: &str) -> Option<usize> {
        self.na_counts
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, n)| *n)
    }

    /// Fail with `MissingColumns` unless all canonical columns are present
    pub fn ensure_columns(&self) -> Result<()> {
        if self.missing_columns.is_empty() {
            Ok(())
        } else {
            Err(BioflowError::MissingColumns {
                columns: self
                    .missing_columns
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
        }
    }
}

/// Inspect a table after column normalization
pub fn validate(table: &Table) -> ValidationReport {
    let normalized = normalize(table);

    let na_counts: Vec<(String, usize)> = normalized
        .columns()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let n = normalized.rows().iter().filter(|row| row[j].is_missing()).count();
            (name.clone(), n)
        })
        .collect();

    let missing_columns: Vec<CanonicalColumn> = CanonicalColumn::ALL
        .into_iter()
        .filter(|c| normalized.column_index(c.as_str()).is_none())
        .collect();

    let mut numeric_issue = false;
    for column in [CanonicalColumn::Ctrl, CanonicalColumn::Treat] {
        if let Some(mut cells) = normalized.column(column.as_str()) {
            if !cells.all(|cell| cell.is_numeric_convertible()) {
                warn!("Column '{}' contains non-numeric values", column);
                numeric_issue = true;
            }
        }
    }

    debug!(
        "Validated {} rows, missing columns: {:?}",
        normalized.n_rows(),
        missing_columns
    );

    ValidationReport {
        row_count: normalized.n_rows(),
        na_counts,
        missing_columns,
        numeric_issue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_table_reports_nothing() {
        let table = Table::from_text_rows(
            &["gene_id", "control", "treatment"],
            &[&["A", "1", "2"], &["B", "3", "4"]],
        )
        .unwrap();
        let report = validate(&table);
        assert_eq!(report.row_count, 2);
        assert!(report.missing_columns.is_empty());
        assert!(!report.numeric_issue);
        assert_eq!(report.na_count("ctrl"), Some(0));
        assert!(report.ensure_columns().is_ok());
    }

    #[test]
    fn test_missing_columns_in_canonical_order() {
        let table = Table::from_text_rows(&["trt", "other"], &[&["1", "x"]]).unwrap();
        let report = validate(&table);
        assert_eq!(
            report.missing_columns,
            vec![CanonicalColumn::Gene, CanonicalColumn::Ctrl]
        );
        match report.ensure_columns() {
            Err(BioflowError::MissingColumns { columns }) => {
                assert_eq!(columns, vec!["gene".to_string(), "ctrl".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_na_counts_cover_every_column() {
        let table = Table::from_text_rows(
            &["gene", "ctrl", "treat", "note"],
            &[&["A", "", "2", ""], &["", "NA", "4", ""], &["C", "1", "", "z"]],
        )
        .unwrap();
        let report = validate(&table);
        assert_eq!(
            report.na_counts,
            vec![
                ("gene".to_string(), 1),
                ("ctrl".to_string(), 2),
                ("treat".to_string(), 1),
                ("note".to_string(), 2),
            ]
        );
        // missing cells alone are not a numeric issue
        assert!(!report.numeric_issue);
    }

    #[test]
    fn test_na_counts_serialize_as_ordered_object() {
        let table = Table::from_text_rows(
            &["treat", "gene", "ctrl"],
            &[&["1", "", "NA"], &["2", "B", ""]],
        )
        .unwrap();
        let report = validate(&table);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""na_counts":{"treat":0,"gene":1,"ctrl":2}"#), "{}", json);

        let parsed: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_single_bad_value_flags_numeric_issue() {
        let table = Table::from_text_rows(
            &["gene", "ctrl", "treat"],
            &[&["A", "1", "2"], &["B", "3", "high"]],
        )
        .unwrap();
        assert!(validate(&table).numeric_issue);
    }

    #[test]
    fn test_validate_is_pure() {
        let table = Table::from_text_rows(
            &["Gene", "CTRL", "TREAT"],
            &[&["A", "x", "2"], &["A", "", "4"]],
        )
        .unwrap();
        let before = table.clone();
        let first = validate(&table);
        let second = validate(&table);
        assert_eq!(first, second);
        assert_eq!(table, before);
    }
}
