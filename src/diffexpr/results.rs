//! Differential results structure

use serde::{Deserialize, Serialize};

/// Fixed |log2FC| cutoff for calling a gene up or down (a 2x change)
pub const LOG2FC_THRESHOLD: f64 = 1.0;

/// Direction of change of a gene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Unchanged,
}

impl Direction {
    /// Classify a log2 fold change against the fixed threshold.
    /// Both comparisons are false for NaN, which therefore falls through to `Unchanged`.
    pub fn classify(log2_fold_change: f64) -> Self {
        if log2_fold_change >= LOG2FC_THRESHOLD {
            Direction::Up
        } else if log2_fold_change <= -LOG2FC_THRESHOLD {
            Direction::Down
        } else {
            Direction::Unchanged
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One gene of the result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRow {
    pub gene: Option<String>,
    pub ctrl: f64,
    pub treat: f64,
    pub delta: f64,
    pub fold_change: f64,
    pub log2_fold_change: f64,
    pub direction: Direction,
}

/// Result table, ranked by |log2FC| descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResults {
    /// Gene identifiers (absent if the input had no gene column)
    pub gene_ids: Option<Vec<String>>,
    pub ctrl: Vec<f64>,
    pub treat: Vec<f64>,
    /// treat - ctrl
    pub delta: Vec<f64>,
    /// (treat + eps) / (ctrl + eps)
    pub fold_change: Vec<f64>,
    pub log2_fold_changes: Vec<f64>,
    pub directions: Vec<Direction>,
}

impl DiffResults {
    /// Get number of genes
    pub fn n_genes(&self) -> usize {
        self.log2_fold_changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_genes() == 0
    }

    /// Row `i` of the table
    pub fn row(&self, i: usize) -> Option<DiffRow> {
        if i >= self.n_genes() {
            return None;
        }
        Some(DiffRow {
            gene: self.gene_ids.as_ref().map(|g| g[i].clone()),
            ctrl: self.ctrl[i],
            treat: self.treat[i],
            delta: self.delta[i],
            fold_change: self.fold_change[i],
            log2_fold_change: self.log2_fold_changes[i],
            direction: self.directions[i],
        })
    }

    /// All rows in ranked order
    pub fn rows(&self) -> Vec<DiffRow> {
        (0..self.n_genes()).filter_map(|i| self.row(i)).collect()
    }

    /// Genes with the given direction, in ranked order
    pub fn genes_with_direction(&self, direction: Direction) -> Vec<&str> {
        match &self.gene_ids {
            Some(ids) => ids
                .iter()
                .zip(self.directions.iter())
                .filter(|(_, &d)| d == direction)
                .map(|(id, _)| id.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Count rows per direction
    pub fn summary(&self) -> DiffSummary {
        let count = |dir: Direction| self.directions.iter().filter(|&&d| d == dir).count();
        DiffSummary {
            total: self.n_genes(),
            up: count(Direction::Up),
            down: count(Direction::Down),
        }
    }
}

/// Gene counts of a result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
}

impl DiffSummary {
    pub fn unchanged(&self) -> usize {
        self.total - self.up - self.down
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "共 {} 基因；|log2FC|>=1 上調 {}、下調 {}",
            self.total, self.up, self.down
        )
    }
}
