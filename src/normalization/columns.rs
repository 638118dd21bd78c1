//! Column-name normalization
//!
//! Uploaded tables name their columns in many ways ("control", "Treatment",
//! "gene_id", ...). Every alias below is renamed to its canonical name;
//! matching is exact and case-sensitive.

use log::debug;

use crate::data::{CanonicalColumn, Table};

/// Known aliases for each canonical column
pub const COLUMN_ALIASES: [(CanonicalColumn, &[&str]); 3] = [
    (CanonicalColumn::Gene, &["gene", "gene_id", "symbol", "Gene", "GENE"]),
    (CanonicalColumn::Ctrl, &["ctrl", "control", "CTRL", "Control", "ctl"]),
    (CanonicalColumn::Treat, &["treat", "treatment", "TREAT", "Treatment", "trt"]),
];

/// Look up the canonical column an input column name is an alias of
pub fn canonical_name(column: &str) -> Option<CanonicalColumn> {
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&column))
        .map(|(canonical, _)| *canonical)
}

/// Rename alias columns to their canonical names.
///
/// Columns outside every alias set pass through untouched. When several
/// columns alias the same canonical name, the one latest in column order
/// wins and the earlier ones are dropped. The input is never modified.
pub fn normalize(table: &Table) -> Table {
    let targets: Vec<Option<CanonicalColumn>> =
        table.columns().iter().map(|c| canonical_name(c)).collect();

    let mut keep = Vec::with_capacity(targets.len());
    let mut names = Vec::with_capacity(targets.len());
    for (i, target) in targets.iter().enumerate() {
        match target {
            Some(canonical) => {
                let shadowed = targets[i + 1..].contains(&Some(*canonical));
                if shadowed {
                    debug!(
                        "Column '{}' shadowed by a later '{}' alias",
                        table.columns()[i],
                        canonical
                    );
                    continue;
                }
                keep.push(i);
                names.push(canonical.as_str().to_string());
            }
            None => {
                keep.push(i);
                names.push(table.columns()[i].clone());
            }
        }
    }

    table.select(&keep, names)
}
