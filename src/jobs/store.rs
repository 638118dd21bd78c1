//! SQLite-backed job history

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BioflowError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id      TEXT NOT NULL UNIQUE,
    user_id     TEXT NOT NULL,
    status      TEXT NOT NULL,
    summary     TEXT,
    created_at  TEXT NOT NULL,
    upload_path TEXT,
    result_path TEXT,
    plot_path   TEXT
);
CREATE INDEX IF NOT EXISTS jobs_user_idx ON jobs (user_id, id);
";

const SELECT_COLUMNS: &str =
    "job_id, user_id, status, summary, created_at, upload_path, result_path, plot_path";

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "finished" => Some(JobStatus::Finished),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl ToSql for JobStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| JobStatus::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

/// One analysis job and its artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub user: String,
    pub status: JobStatus,
    pub summary: Option<String>,
    /// RFC 3339 creation time (UTC)
    pub created_at: String,
    pub upload_path: Option<String>,
    pub result_path: Option<String>,
    pub plot_path: Option<String>,
}

fn file_name(path: &Option<String>) -> Option<String> {
    path.as_deref()
        .and_then(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
}

impl JobRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            job_id: row.get(0)?,
            user: row.get(1)?,
            status: row.get(2)?,
            summary: row.get(3)?,
            created_at: row.get(4)?,
            upload_path: row.get(5)?,
            result_path: row.get(6)?,
            plot_path: row.get(7)?,
        })
    }

    pub fn result_filename(&self) -> Option<String> {
        file_name(&self.result_path)
    }

    pub fn plot_filename(&self) -> Option<String> {
        file_name(&self.plot_path)
    }

    /// Artifact files of this job, in deletion order
    fn artifact_paths(&self) -> impl Iterator<Item = &str> {
        [&self.result_path, &self.plot_path, &self.upload_path]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

/// Remove a job's files; failures are logged, not fatal
fn remove_artifacts(job: &JobRecord) {
    for path in job.artifact_paths() {
        let path = Path::new(path);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Persistent store of analysis jobs, keyed by job id and owned by a user
pub struct JobStore {
    conn: Connection,
}

impl JobStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Register a new queued job
    pub fn create_job(&self, user: &str, upload_path: Option<&str>) -> Result<JobRecord> {
        let job = JobRecord {
            job_id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            status: JobStatus::Queued,
            summary: None,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            upload_path: upload_path.map(str::to_string),
            result_path: None,
            plot_path: None,
        };

        self.conn.execute(
            "INSERT INTO jobs (job_id, user_id, status, created_at, upload_path) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![job.job_id, job.user, job.status, job.created_at, job.upload_path],
        )?;
        Ok(job)
    }

    /// Record a successful analysis
    pub fn finish_job(
        &self,
        job_id: &str,
        summary: &str,
        result_path: &str,
        plot_path: Option<&str>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE jobs SET status = ?1, summary = ?2, result_path = ?3, plot_path = ?4 WHERE job_id = ?5",
            params![JobStatus::Finished, summary, result_path, plot_path, job_id],
        )?;
        Self::expect_one(changed, job_id)
    }

    /// Mark a job as failed
    pub fn fail_job(&self, job_id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE jobs SET status = ?1 WHERE job_id = ?2",
            params![JobStatus::Failed, job_id],
        )?;
        Self::expect_one(changed, job_id)
    }

    fn expect_one(changed: usize, job_id: &str) -> Result<()> {
        if changed == 0 {
            Err(BioflowError::JobNotFound {
                job_id: job_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// A user's jobs, newest first
    pub fn list_jobs(&self, user: &str) -> Result<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs WHERE user_id = ?1 ORDER BY id DESC",
            SELECT_COLUMNS
        ))?;
        let jobs = stmt
            .query_map(params![user], JobRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }

    /// One job owned by `user`; jobs of other users are reported as not found
    pub fn get_job(&self, user: &str, job_id: &str) -> Result<JobRecord> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM jobs WHERE job_id = ?1 AND user_id = ?2",
                    SELECT_COLUMNS
                ),
                params![job_id, user],
                JobRecord::from_row,
            )
            .optional()?
            .ok_or_else(|| BioflowError::JobNotFound {
                job_id: job_id.to_string(),
            })
    }

    /// Delete a job and its files
    pub fn delete_job(&self, user: &str, job_id: &str) -> Result<()> {
        let job = self.get_job(user, job_id)?;
        remove_artifacts(&job);
        self.conn
            .execute("DELETE FROM jobs WHERE job_id = ?1", params![job_id])?;
        info!("Deleted job {}", job_id);
        Ok(())
    }

    /// Keep only the newest `keep` jobs of `user`, deleting older jobs and
    /// their files. Runs in one immediate transaction so concurrent writers
    /// to the same database wait for the eviction to finish.
    /// Returns the evicted job ids.
    pub fn enforce_quota(&mut self, user: &str, keep: usize) -> Result<Vec<String>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let evicted: Vec<JobRecord> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM jobs WHERE user_id = ?1 ORDER BY id DESC",
                SELECT_COLUMNS
            ))?;
            let jobs = stmt
                .query_map(params![user], JobRecord::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            jobs.into_iter().skip(keep).collect()
        };

        for job in &evicted {
            tx.execute("DELETE FROM jobs WHERE job_id = ?1", params![job.job_id])?;
        }
        tx.commit()?;

        // Files go only after the rows are gone for good.
        for job in &evicted {
            remove_artifacts(job);
        }
        if !evicted.is_empty() {
            info!(
                "Evicted {} old jobs of user '{}' (keeping {})",
                evicted.len(),
                user,
                keep
            );
        }
        Ok(evicted.into_iter().map(|j| j.job_id).collect())
    }

    /// Resolve a result or plot file name belonging to one of `user`'s jobs
    pub fn find_artifact(&self, user: &str, name: &str) -> Result<PathBuf> {
        let not_found = || BioflowError::ArtifactNotFound {
            name: name.to_string(),
        };
        let path = self
            .list_jobs(user)?
            .into_iter()
            .find_map(|job| {
                if job.result_filename().as_deref() == Some(name) {
                    job.result_path
                } else if job.plot_filename().as_deref() == Some(name) {
                    job.plot_path
                } else {
                    None
                }
            })
            .map(PathBuf::from)
            .ok_or_else(not_found)?;

        if path.exists() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }
}
