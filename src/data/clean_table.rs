//! Cleaned, typed expression table

use serde::{Deserialize, Serialize};

/// The three column names every pipeline stage keys on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalColumn {
    Gene,
    Ctrl,
    Treat,
}

impl CanonicalColumn {
    /// Required columns in report order
    pub const ALL: [CanonicalColumn; 3] =
        [CanonicalColumn::Gene, CanonicalColumn::Ctrl, CanonicalColumn::Treat];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalColumn::Gene => "gene",
            CanonicalColumn::Ctrl => "ctrl",
            CanonicalColumn::Treat => "treat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One gene with its control and treatment values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
    pub gene: String,
    pub ctrl: f64,
    pub treat: f64,
}

impl CleanRow {
    pub fn new(gene: &str, ctrl: f64, treat: f64) -> Self {
        Self {
            gene: gene.to_string(),
            ctrl,
            treat,
        }
    }
}

/// Column-oriented result of cleaning.
///
/// A canonical column is either present for every row or absent entirely;
/// present numeric columns never contain NaN and genes are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanTable {
    n_rows: usize,
    genes: Option<Vec<String>>,
    ctrl: Option<Vec<f64>>,
    treat: Option<Vec<f64>>,
}

impl CleanTable {
    /// Build a complete table (all three columns present) from rows
    pub fn from_rows(rows: Vec<CleanRow>) -> Self {
        let n_rows = rows.len();
        let mut genes = Vec::with_capacity(n_rows);
        let mut ctrl = Vec::with_capacity(n_rows);
        let mut treat = Vec::with_capacity(n_rows);
        for row in rows {
            genes.push(row.gene);
            ctrl.push(row.ctrl);
            treat.push(row.treat);
        }
        Self {
            n_rows,
            genes: Some(genes),
            ctrl: Some(ctrl),
            treat: Some(treat),
        }
    }

    pub(crate) fn from_columns(
        n_rows: usize,
        genes: Option<Vec<String>>,
        ctrl: Option<Vec<f64>>,
        treat: Option<Vec<f64>>,
    ) -> Self {
        debug_assert!(genes.as_ref().map_or(true, |g| g.len() == n_rows));
        debug_assert!(ctrl.as_ref().map_or(true, |c| c.len() == n_rows));
        debug_assert!(treat.as_ref().map_or(true, |t| t.len() == n_rows));
        Self {
            n_rows,
            genes,
            ctrl,
            treat,
        }
    }

    /// Get the number of rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn genes(&self) -> Option<&[String]> {
        self.genes.as_deref()
    }

    pub fn ctrl(&self) -> Option<&[f64]> {
        self.ctrl.as_deref()
    }

    pub fn treat(&self) -> Option<&[f64]> {
        self.treat.as_deref()
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        match column {
            CanonicalColumn::Gene => self.genes.is_some(),
            CanonicalColumn::Ctrl => self.ctrl.is_some(),
            CanonicalColumn::Treat => self.treat.is_some(),
        }
    }

    /// Present canonical columns in canonical order
    pub fn columns(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::ALL
            .into_iter()
            .filter(|c| self.has_column(*c))
            .collect()
    }

    /// Rows as records; `None` unless all three columns are present
    pub fn rows(&self) -> Option<Vec<CleanRow>> {
        let (genes, ctrl, treat) = (self.genes()?, self.ctrl()?, self.treat()?);
        Some(
            genes
                .iter()
                .zip(ctrl.iter().zip(treat.iter()))
                .map(|(g, (&c, &t))| CleanRow::new(g, c, t))
                .collect(),
        )
    }
}
