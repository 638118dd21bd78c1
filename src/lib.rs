//! bioflow: two-condition fold-change analysis in Rust
//!
//! Takes a table of genes with a control and a treatment value, computes
//! per-gene fold changes, calls genes up/down/unchanged at a fixed 2x
//! cutoff, and ranks them by effect size.
//!
//! # Example
//!
//! ```ignore
//! use bioflow::prelude::*;
//!
//! let table = read_table("expression.csv")?;
//! let output = run_pipeline(&table, &DiffParams::default())?;
//! println!("{}", output.summary);
//! write_results("result.csv", &output.results)?;
//! plot_volcano(&output.results, "volcano.png", &VolcanoConfig::default())?;
//! ```

pub mod cleaning;
pub mod cli;
pub mod data;
pub mod diffexpr;
pub mod error;
pub mod io;
pub mod jobs;
pub mod normalization;
pub mod plot;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cleaning::clean;
    pub use crate::data::{CanonicalColumn, Cell, CleanRow, CleanTable, Table};
    pub use crate::diffexpr::{compute_diff, DiffParams, DiffResults, DiffRow, DiffSummary, Direction};
    pub use crate::error::{BioflowError, Result};
    pub use crate::io::{read_table, write_results, write_summary};
    pub use crate::jobs::{submit_job, JobRecord, JobStatus, JobStore, JobStoreConfig};
    pub use crate::normalization::normalize;
    pub use crate::plot::{plot_volcano, VolcanoConfig};
    pub use crate::validation::{validate, ValidationReport};
    pub use crate::{run_pipeline, PipelineOutput};
}

use log::info;
use prelude::*;

/// Everything one pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: ValidationReport,
    pub results: DiffResults,
    pub summary: DiffSummary,
}

/// Run the complete pipeline: validate, clean, compute.
///
/// Stops with `EmptyInput` when the table has no rows, `MissingColumns`
/// when a canonical column cannot be found, and `EmptyAfterClean` when no
/// usable row survives cleaning.
pub fn run_pipeline(table: &Table, params: &DiffParams) -> Result<PipelineOutput> {
    if table.is_empty() {
        return Err(BioflowError::EmptyInput);
    }
    info!("Loaded {} rows, {} columns", table.n_rows(), table.n_columns());

    let report = validate(table);
    report.ensure_columns()?;

    let cleaned = clean(table);
    if cleaned.is_empty() {
        return Err(BioflowError::EmptyAfterClean);
    }

    let (results, summary) = compute_diff(&cleaned, params)?;
    Ok(PipelineOutput {
        report,
        results,
        summary,
    })
}
