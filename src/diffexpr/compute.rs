//! Fold-change computation and ranking

use std::cmp::Ordering;

use log::{debug, info};
use ndarray::Array1;

use super::results::{DiffResults, DiffSummary, Direction};
use crate::data::{CanonicalColumn, CleanTable};
use crate::error::{BioflowError, Result};

/// Parameters for the fold-change computation
#[derive(Debug, Clone)]
pub struct DiffParams {
    /// Pseudo-value added to both ctrl and treat before dividing
    pub eps: f64,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self { eps: 1e-9 }
    }
}

/// Order by |value| descending with NaN last
fn by_abs_descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.abs().total_cmp(&a.abs()),
    }
}

fn required<'a>(values: Option<&'a [f64]>, column: CanonicalColumn) -> Result<&'a [f64]> {
    values.ok_or_else(|| BioflowError::InvalidInput {
        reason: format!("fold-change computation requires column '{}'", column),
    })
}

/// Compute delta, fold change, log2 fold change and direction for every
/// gene, ranked by |log2FC| descending.
///
/// No domain restriction is applied: zero or negative inputs produce
/// whatever IEEE-754 arithmetic gives (a negative fold change has a NaN
/// log2FC, which is classified `unchanged` and ranked last). Ties keep the
/// input order.
pub fn compute_diff(table: &CleanTable, params: &DiffParams) -> Result<(DiffResults, DiffSummary)> {
    let ctrl = Array1::from(required(table.ctrl(), CanonicalColumn::Ctrl)?.to_vec());
    let treat = Array1::from(required(table.treat(), CanonicalColumn::Treat)?.to_vec());
    let eps = params.eps;

    let delta = &treat - &ctrl;
    let fold_change = (&treat + eps) / (&ctrl + eps);
    let log2_fc = fold_change.mapv(f64::log2);

    let mut order: Vec<usize> = (0..log2_fc.len()).collect();
    // slice::sort_by is stable
    order.sort_by(|&a, &b| by_abs_descending(log2_fc[a], log2_fc[b]));

    let pick = |values: &Array1<f64>| -> Vec<f64> { order.iter().map(|&i| values[i]).collect() };
    let log2_fold_changes = pick(&log2_fc);
    let directions: Vec<Direction> = log2_fold_changes
        .iter()
        .map(|&l| Direction::classify(l))
        .collect();

    let results = DiffResults {
        gene_ids: table
            .genes()
            .map(|genes| order.iter().map(|&i| genes[i].clone()).collect()),
        ctrl: pick(&ctrl),
        treat: pick(&treat),
        delta: pick(&delta),
        fold_change: pick(&fold_change),
        log2_fold_changes,
        directions,
    };

    let n_nan = results.log2_fold_changes.iter().filter(|l| l.is_nan()).count();
    if n_nan > 0 {
        debug!("{} genes have an undefined log2 fold change", n_nan);
    }

    let summary = results.summary();
    info!(
        "Computed fold changes for {} genes: {} up, {} down",
        summary.total, summary.up, summary.down
    );
    Ok((results, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CleanRow;

    fn table(rows: &[(&str, f64, f64)]) -> CleanTable {
        CleanTable::from_rows(rows.iter().map(|&(g, c, t)| CleanRow::new(g, c, t)).collect())
    }

    fn single(ctrl: f64, treat: f64, eps: f64) -> DiffResults {
        compute_diff(&table(&[("G1", ctrl, treat)]), &DiffParams { eps }).unwrap().0
    }

    #[test]
    fn test_fold_change_arithmetic() {
        let res = single(2.0, 8.0, 1e-9);
        assert_eq!(res.delta[0], 6.0);
        assert!((res.fold_change[0] - 4.0).abs() < 1e-6);
        assert!((res.log2_fold_changes[0] - 2.0).abs() < 1e-6);
        assert_eq!(res.directions[0], Direction::Up);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // Without the pseudo-value a doubling is exactly log2FC = 1.
        let res = single(1.0, 2.0, 0.0);
        assert_eq!(res.fold_change[0], 2.0);
        assert_eq!(res.log2_fold_changes[0], 1.0);
        assert_eq!(res.directions[0], Direction::Up);

        let res = single(2.0, 4.0 - 1e-6, 0.0);
        assert!(res.log2_fold_changes[0] < 1.0);
        assert_eq!(res.directions[0], Direction::Unchanged);
    }

    #[test]
    fn test_default_eps_pulls_doubling_below_threshold() {
        let res = single(1.0, 2.0, 1e-9);
        assert!((res.fold_change[0] - 2.0).abs() < 1e-8);
        assert!(res.log2_fold_changes[0] < 1.0);
        assert_eq!(res.directions[0], Direction::Unchanged);
    }

    #[test]
    fn test_symmetry() {
        let res = single(8.0, 2.0, 1e-9);
        assert_eq!(res.delta[0], -6.0);
        assert!((res.log2_fold_changes[0] + 2.0).abs() < 1e-6);
        assert_eq!(res.directions[0], Direction::Down);
    }

    #[test]
    fn test_zero_values() {
        let res = single(0.0, 0.0, 1e-9);
        assert_eq!(res.fold_change[0], 1.0);
        assert_eq!(res.log2_fold_changes[0], 0.0);
        assert_eq!(res.directions[0], Direction::Unchanged);
    }

    #[test]
    fn test_negative_values_are_not_clamped() {
        let res = single(-1.0, 1.0, 1e-9);
        assert!(res.fold_change[0] < 0.0);
        assert!(res.log2_fold_changes[0].is_nan());
        assert_eq!(res.directions[0], Direction::Unchanged);
    }

    #[test]
    fn test_sort_by_absolute_log2fc() {
        let values = [0.5, -3.0, 1.2, -1.2];
        let rows: Vec<(String, f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &l)| (format!("g{}", i), 1.0, 2f64.powf(l)))
            .collect();
        let rows: Vec<(&str, f64, f64)> = rows.iter().map(|(g, c, t)| (g.as_str(), *c, *t)).collect();
        let (res, _) = compute_diff(&table(&rows), &DiffParams::default()).unwrap();

        assert_eq!(res.gene_ids.as_ref().unwrap(), &["g1", "g2", "g3", "g0"]);
        let expected = [-3.0, 1.2, -1.2, 0.5];
        for (got, want) in res.log2_fold_changes.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {}, want {}", got, want);
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let t = table(&[("down", 4.0, 1.0), ("up", 1.0, 4.0), ("flat", 3.0, 3.0)]);
        let (res, _) = compute_diff(&t, &DiffParams { eps: 0.0 }).unwrap();
        assert_eq!(res.log2_fold_changes, vec![-2.0, 2.0, 0.0]);
        assert_eq!(res.gene_ids.unwrap(), vec!["down", "up", "flat"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let t = table(&[("neg", -2.0, 3.0), ("small", 1.0, 1.1), ("big", 1.0, 16.0)]);
        let (res, _) = compute_diff(&t, &DiffParams::default()).unwrap();
        assert_eq!(res.gene_ids.unwrap(), vec!["big", "small", "neg"]);
        assert!(res.log2_fold_changes[2].is_nan());
    }

    #[test]
    fn test_summary_counts() {
        let t = table(&[
            ("a", 1.0, 8.0),
            ("b", 1.0, 1.1),
            ("c", 2.0, 9.0),
            ("d", 10.0, 1.0),
            ("e", 5.0, 5.0),
        ]);
        let (res, summary) = compute_diff(&t, &DiffParams::default()).unwrap();
        assert_eq!(summary, DiffSummary { total: 5, up: 2, down: 1 });
        assert_eq!(summary, res.summary());
        assert_eq!(summary.to_string(), "共 5 基因；|log2FC|>=1 上調 2、下調 1");
        assert_eq!(res.genes_with_direction(Direction::Up), vec!["a", "c"]);
    }

    #[test]
    fn test_empty_table() {
        let (res, summary) = compute_diff(&CleanTable::from_rows(vec![]), &DiffParams::default()).unwrap();
        assert!(res.is_empty());
        assert_eq!(summary, DiffSummary { total: 0, up: 0, down: 0 });
    }

    #[test]
    fn test_missing_ctrl_is_contract_violation() {
        let partial = CleanTable::from_columns(1, Some(vec!["A".to_string()]), None, Some(vec![1.0]));
        match compute_diff(&partial, &DiffParams::default()) {
            Err(BioflowError::InvalidInput { reason }) => assert!(reason.contains("ctrl")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_without_gene_column() {
        let partial = CleanTable::from_columns(2, None, Some(vec![1.0, 1.0]), Some(vec![1.0, 4.0]));
        let (res, summary) = compute_diff(&partial, &DiffParams::default()).unwrap();
        assert!(res.gene_ids.is_none());
        assert_eq!(res.row(0).unwrap().direction, Direction::Up);
        assert_eq!(summary.total, 2);
    }
}
