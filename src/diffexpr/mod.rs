//! Two-condition fold-change analysis

mod compute;
mod results;

pub use compute::{compute_diff, DiffParams};
pub use results::{DiffResults, DiffRow, DiffSummary, Direction, LOG2FC_THRESHOLD};
