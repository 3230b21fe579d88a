//! Sync job type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Opaque identifier assigned by the remote system upon successful submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle state of a sync job
///
/// `Pending` and `Running` are reported by the remote system; `Cancelled` is
/// purely local. A locally cancelled job may keep running remotely, only the
/// local tracking and polling stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Caller-supplied options forwarded verbatim in the submission payload
///
/// The orchestrator never interprets these; field names match the remote
/// API's payload keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub download_assets: bool,
    #[serde(default = "default_true")]
    pub optimize_images: bool,
    #[serde(default = "default_true")]
    pub keep_original_images: bool,
    #[serde(default)]
    pub force_sync_images: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_item_ids: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            download_assets: true,
            optimize_images: true,
            keep_original_images: true,
            force_sync_images: false,
            filters: None,
            filtered_item_ids: None,
        }
    }
}

/// Registry entry for a job that has been accepted by the remote system
///
/// Exclusively owned by the `JobRegistry` while active; the cancellation
/// token is invalidated at most once.
#[derive(Debug, Clone)]
pub struct ActiveJob {
    pub job_id: JobId,
    pub resource_id: Uuid,
    /// Latest remote-reported state, refreshed from poll snapshots
    pub status: JobStatus,
    /// Submission attempts that were retried before the job was accepted
    pub retry_count: u32,
    pub token: CancellationToken,
    pub started_at: DateTime<Utc>,
    pub options: SyncOptions,
}

/// Read-only snapshot of an active job for introspection by callers
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJobInfo {
    pub job_id: JobId,
    pub resource_id: Uuid,
    pub status: JobStatus,
    pub retry_count: u32,
    pub started_at: DateTime<Utc>,
}

impl From<&ActiveJob> for ActiveJobInfo {
    fn from(job: &ActiveJob) -> Self {
        Self {
            job_id: job.job_id.clone(),
            resource_id: job.resource_id,
            status: job.status,
            retry_count: job.retry_count,
            started_at: job.started_at,
        }
    }
}

/// Remote job state as returned by `GET /sync-jobs/{job_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteJobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub progress_message: Option<String>,
    /// Append-only log lines provided by the remote system
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Snapshot pushed to progress subscribers on every successful poll
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub resource_id: Uuid,
    pub status: JobStatus,
    pub message: Option<String>,
    pub logs: Vec<String>,
    pub at: DateTime<Utc>,
}

impl ProgressEvent {
    pub(crate) fn from_snapshot(
        job_id: &JobId,
        resource_id: Uuid,
        snapshot: &RemoteJobSnapshot,
    ) -> Self {
        Self {
            job_id: job_id.clone(),
            resource_id,
            status: snapshot.status,
            message: snapshot.progress_message.clone(),
            logs: snapshot.logs.clone(),
            at: Utc::now(),
        }
    }
}

/// Per-call progress observer, invoked on every `ProgressEvent` for one job
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Final result of a completed sync job, returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub job_id: JobId,
    pub message: String,
    pub logs: Vec<String>,
}
