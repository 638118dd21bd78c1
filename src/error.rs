//! Error types for bioflow

use thiserror::Error;

/// Main error type for bioflow operations
#[derive(Error, Debug)]
pub enum BioflowError {
    #[error("Empty input: the table has no data rows")]
    EmptyInput,

    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("No rows left after cleaning")]
    EmptyAfterClean,

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invalid table: {reason}")]
    InvalidTable { reason: String },

    #[error("Plot rendering failed: {reason}")]
    Plot { reason: String },

    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("Artifact not found: {name}")]
    ArtifactNotFound { name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl BioflowError {
    /// True for failures caused by the uploaded data itself
    /// (empty table, missing columns, nothing left after cleaning).
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            BioflowError::EmptyInput
                | BioflowError::MissingColumns { .. }
                | BioflowError::EmptyAfterClean
        )
    }
}

/// Result type alias for bioflow operations
pub type Result<T> = std::result::Result<T, BioflowError>;
