//! Cleaning of normalized tables into typed gene records
//!
//! Steps, in order:
//! 1. Normalize column names
//! 2. Project to the canonical columns that exist
//! 3. Coerce ctrl/treat to numbers (unparseable values become missing)
//! 4. Drop rows missing in every projected column
//! 5. Drop rows missing any present canonical column
//! 6. Deduplicate by gene, keeping the first occurrence

use std::collections::HashSet;

use log::{info, warn};

use crate::data::{CanonicalColumn, Cell, CleanTable, Table};
use crate::normalization::normalize;

/// One projected row: the outer `Option` of each field is column presence,
/// the inner one is the cell value after coercion.
struct Projected {
    gene: Option<Option<String>>,
    ctrl: Option<Option<f64>>,
    treat: Option<Option<f64>>,
}

impl Projected {
    fn values_missing(&self) -> impl Iterator<Item = bool> + '_ {
        [
            self.gene.as_ref().map(|g| g.is_none()),
            self.ctrl.map(|c| c.is_none()),
            self.treat.map(|t| t.is_none()),
        ]
        .into_iter()
        .flatten()
    }

    fn all_missing(&self) -> bool {
        self.values_missing().all(|m| m)
    }

    fn any_missing(&self) -> bool {
        self.values_missing().any(|m| m)
    }
}

/// Clean a table. Never fails; an empty result is valid and must be
/// checked by the caller.
pub fn clean(table: &Table) -> CleanTable {
    let normalized = normalize(table);
    let gene_idx = normalized.column_index(CanonicalColumn::Gene.as_str());
    let ctrl_idx = normalized.column_index(CanonicalColumn::Ctrl.as_str());
    let treat_idx = normalized.column_index(CanonicalColumn::Treat.as_str());

    if gene_idx.is_none() && ctrl_idx.is_none() && treat_idx.is_none() {
        // Nothing to project; only fully blank rows can be dropped.
        let n_rows = normalized
            .rows()
            .iter()
            .filter(|row| !row.iter().all(Cell::is_missing))
            .count();
        warn!("No canonical columns present; cleaned table has no columns");
        return CleanTable::from_columns(n_rows, None, None, None);
    }

    let projected: Vec<Projected> = normalized
        .rows()
        .iter()
        .map(|row| Projected {
            gene: gene_idx.map(|j| row[j].to_text()),
            ctrl: ctrl_idx.map(|j| row[j].to_number()),
            treat: treat_idx.map(|j| row[j].to_number()),
        })
        .collect();
    let n_input = projected.len();

    let non_blank: Vec<Projected> = projected.into_iter().filter(|p| !p.all_missing()).collect();
    let n_blank = n_input - non_blank.len();

    let complete: Vec<Projected> = non_blank.into_iter().filter(|p| !p.any_missing()).collect();
    let n_incomplete = n_input - n_blank - complete.len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut n_duplicates = 0;
    let mut genes = gene_idx.map(|_| Vec::new());
    let mut ctrl = ctrl_idx.map(|_| Vec::new());
    let mut treat = treat_idx.map(|_| Vec::new());
    let mut n_rows = 0;

    for row in complete {
        if let Some(Some(gene)) = &row.gene {
            if !seen.insert(gene.clone()) {
                n_duplicates += 1;
                continue;
            }
        }
        if let (Some(col), Some(Some(g))) = (genes.as_mut(), row.gene) {
            col.push(g);
        }
        if let (Some(col), Some(Some(c))) = (ctrl.as_mut(), row.ctrl) {
            col.push(c);
        }
        if let (Some(col), Some(Some(t))) = (treat.as_mut(), row.treat) {
            col.push(t);
        }
        n_rows += 1;
    }

    if n_incomplete > 0 {
        warn!("Dropped {} rows with missing or non-numeric values", n_incomplete);
    }
    if n_duplicates > 0 {
        warn!("Dropped {} rows with duplicate gene identifiers", n_duplicates);
    }
    info!(
        "Cleaning kept {} of {} rows ({} blank)",
        n_rows, n_input, n_blank
    );

    CleanTable::from_columns(n_rows, genes, ctrl, treat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CleanRow;

    #[test]
    fn test_coerces_and_drops_incomplete_rows() {
        let table = Table::from_text_rows(
            &["gene", "control", "treatment", "extra"],
            &[
                &["A", "1.5", "3", "x"],
                &["B", "oops", "2", "y"],
                &["", "1", "2", "z"],
                &["D", "4", "", "w"],
                &["E", " 2 ", "8", ""],
            ],
        )
        .unwrap();
        let cleaned = clean(&table);
        assert_eq!(
            cleaned.rows().unwrap(),
            vec![CleanRow::new("A", 1.5, 3.0), CleanRow::new("E", 2.0, 8.0)]
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let table = Table::from_text_rows(
            &["gene", "ctrl", "treat"],
            &[&["A", "1", "2"], &["A", "5", "6"], &["B", "3", "4"]],
        )
        .unwrap();
        let cleaned = clean(&table);
        assert_eq!(
            cleaned.rows().unwrap(),
            vec![CleanRow::new("A", 1.0, 2.0), CleanRow::new("B", 3.0, 4.0)]
        );
    }

    #[test]
    fn test_dedup_after_dropping_invalid_first_row() {
        // The first "A" is dropped for a bad value before dedup runs,
        // so the second "A" survives.
        let table = Table::from_text_rows(
            &["gene", "ctrl", "treat"],
            &[&["A", "bad", "2"], &["A", "5", "6"]],
        )
        .unwrap();
        assert_eq!(clean(&table).rows().unwrap(), vec![CleanRow::new("A", 5.0, 6.0)]);
    }

    #[test]
    fn test_clean_never_grows_and_rows_are_complete() {
        let table = Table::from_text_rows(
            &["symbol", "ctl", "trt"],
            &[
                &["A", "1", "2"],
                &["", "", ""],
                &["C", "nan", "2"],
                &["D", "3", "inf"],
            ],
        )
        .unwrap();
        let cleaned = clean(&table);
        assert!(cleaned.n_rows() <= normalize(&table).n_rows());
        for row in cleaned.rows().unwrap() {
            assert!(!row.gene.is_empty());
            assert!(!row.ctrl.is_nan() && !row.treat.is_nan());
        }
        assert_eq!(cleaned.n_rows(), 2);
    }

    #[test]
    fn test_absent_gene_column_skips_gene_steps() {
        let table = Table::from_text_rows(
            &["ctrl", "treat"],
            &[&["1", "2"], &["1", "2"], &["x", "3"]],
        )
        .unwrap();
        let cleaned = clean(&table);
        assert!(!cleaned.has_column(CanonicalColumn::Gene));
        // identical rows are kept: there is no gene to dedup on
        assert_eq!(cleaned.n_rows(), 2);
        assert_eq!(cleaned.ctrl(), Some(&[1.0, 1.0][..]));
    }

    #[test]
    fn test_no_canonical_columns_does_not_panic() {
        let table = Table::from_text_rows(&["a", "b"], &[&["1", ""], &["", ""]]).unwrap();
        let cleaned = clean(&table);
        assert!(cleaned.columns().is_empty());
        assert_eq!(cleaned.n_rows(), 1);
    }

    #[test]
    fn test_all_non_numeric_gives_empty_table() {
        let table = Table::from_text_rows(
            &["gene", "ctrl", "treat"],
            &[&["A", "x", "y"], &["B", "-", "?"]],
        )
        .unwrap();
        let cleaned = clean(&table);
        assert!(cleaned.is_empty());
        assert_eq!(cleaned.columns(), CanonicalColumn::ALL.to_vec());
    }
}
