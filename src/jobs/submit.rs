//! Upload-to-result workflow for stored jobs

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{error, info, warn};

use super::store::{JobRecord, JobStore};
use crate::diffexpr::DiffParams;
use crate::error::{BioflowError, Result};
use crate::io::{read_table, write_results};
use crate::plot::{plot_volcano, VolcanoConfig};
use crate::{run_pipeline, PipelineOutput};

/// File extensions accepted as uploads
const UPLOAD_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

/// Layout and limits of an on-disk job store
#[derive(Debug, Clone)]
pub struct JobStoreConfig {
    /// Directory holding the database, uploads and results
    pub root: PathBuf,
    /// Jobs kept per user; older ones are deleted after each submission
    pub max_jobs_per_user: usize,
}

impl Default for JobStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("bioflow_data"),
            max_jobs_per_user: 20,
        }
    }
}

impl JobStoreConfig {
    /// Default limits with the store under `root`
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("bioflow.db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    /// Create the directory layout and open the database
    pub fn open_store(&self) -> Result<JobStore> {
        fs::create_dir_all(self.uploads_dir())?;
        fs::create_dir_all(self.results_dir())?;
        JobStore::open(&self.db_path())
    }
}

fn check_extension(input: &Path) -> Result<()> {
    let ok = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| UPLOAD_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(BioflowError::InvalidInput {
            reason: format!(
                "Only .csv or .tsv uploads are accepted: {}",
                input.display()
            ),
        })
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Analyze a stored upload and write its result table and plot.
/// On failure, any artifact already written is removed again.
fn run_analysis(
    upload_path: &Path,
    result_path: &Path,
    plot_path: &Path,
    params: &DiffParams,
    volcano: &VolcanoConfig,
) -> Result<PipelineOutput> {
    let outcome = read_table(upload_path)
        .and_then(|table| run_pipeline(&table, params))
        .and_then(|output| {
            write_results(result_path, &output.results)?;
            plot_volcano(&output.results, plot_path, volcano)?;
            Ok(output)
        });

    if outcome.is_err() {
        for path in [result_path, plot_path] {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
    outcome
}

/// Store an upload as a new job for `user`, analyze it, record the outcome,
/// and apply the per-user retention limit.
///
/// On any analysis failure the job is kept with status `failed` and the
/// error is returned.
pub fn submit_job(
    store: &mut JobStore,
    config: &JobStoreConfig,
    user: &str,
    input: &Path,
    params: &DiffParams,
    volcano: &VolcanoConfig,
) -> Result<JobRecord> {
    if config.max_jobs_per_user == 0 {
        return Err(BioflowError::InvalidInput {
            reason: "max_jobs_per_user must be at least 1".to_string(),
        });
    }
    check_extension(input)?;
    let upload_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());

    let stamp = Utc::now().format("%Y%m%d-%H%M%S%.6f").to_string();
    let upload_path = config.uploads_dir().join(format!("{}_{}", stamp, upload_name));
    fs::copy(input, &upload_path)?;

    let job = store.create_job(user, Some(&path_str(&upload_path)))?;
    info!("Created job {} for user '{}'", job.job_id, user);

    let tag = format!("{}_{}", stamp, &job.job_id[..8]);
    let result_path = config.results_dir().join(format!("result_{}.csv", tag));
    let plot_path = config.results_dir().join(format!("volcano_{}.png", tag));

    match run_analysis(&upload_path, &result_path, &plot_path, params, volcano) {
        Ok(output) => {
            store.finish_job(
                &job.job_id,
                &output.summary.to_string(),
                &path_str(&result_path),
                Some(&path_str(&plot_path)),
            )?;
            info!("Job {} finished: {}", job.job_id, output.summary);
        }
        Err(e) => {
            error!("Job {} failed: {}", job.job_id, e);
            store.fail_job(&job.job_id)?;
            return Err(e);
        }
    }

    store.enforce_quota(user, config.max_jobs_per_user)?;
    store.get_job(user, &job.job_id)
}
