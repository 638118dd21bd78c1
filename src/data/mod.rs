//! Data structures for the fold-change pipeline

mod clean_table;
mod table;

pub use clean_table::{CanonicalColumn, CleanRow, CleanTable};
pub use table::{Cell, Table};
