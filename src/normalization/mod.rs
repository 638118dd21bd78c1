//! Normalization of uploaded column names

mod columns;

pub use columns::{canonical_name, normalize, COLUMN_ALIASES};
