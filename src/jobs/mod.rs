//! Per-user job history: stored uploads, results and plots

mod store;
mod submit;

pub use store::{JobRecord, JobStatus, JobStore};
pub use submit::{submit_job, JobStoreConfig};
