//! Process-wide registry of active sync jobs
//!
//! The registry is the only mutable state shared between jobs. A single
//! mutex guards both the job table and the busy-resource set, so the
//! capacity/exclusivity check and the insert happen under one guard and two
//! submitters can never both pass the busy check for the same resource.

use super::types::{ActiveJob, ActiveJobInfo, JobId};
use crate::errors::SyncError;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct RegistryInner {
    jobs: HashMap<JobId, ActiveJob>,
    busy_resources: HashSet<Uuid>,
}

/// Tracks currently active jobs and enforces the concurrency invariants:
/// at most one active job per resource, at most `max_concurrent` in total
#[derive(Debug)]
pub struct JobRegistry {
    max_concurrent: usize,
    inner: Mutex<RegistryInner>,
}

impl JobRegistry {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Whether a job for `resource_id` could be inserted right now
    pub async fn can_start(&self, resource_id: Uuid) -> bool {
        self.check_can_start(resource_id).await.is_ok()
    }

    /// Like `can_start`, but reports which invariant would be violated
    pub async fn check_can_start(&self, resource_id: Uuid) -> Result<(), SyncError> {
        let inner = self.inner.lock().await;
        Self::check_inner(&inner, self.max_concurrent, resource_id)
    }

    fn check_inner(
        inner: &RegistryInner,
        max_concurrent: usize,
        resource_id: Uuid,
    ) -> Result<(), SyncError> {
        if inner.busy_resources.contains(&resource_id) {
            return Err(SyncError::ResourceBusy { resource_id });
        }
        if inner.jobs.len() >= max_concurrent {
            return Err(SyncError::TooManyJobs {
                limit: max_concurrent,
            });
        }
        Ok(())
    }

    /// Insert a freshly accepted job, re-validating both invariants under
    /// the same guard as the insert
    pub async fn try_insert(&self, job: ActiveJob) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().await;
        Self::check_inner(&inner, self.max_concurrent, job.resource_id)?;

        info!(
            job_id = %job.job_id,
            resource_id = %job.resource_id,
            active = inner.jobs.len() + 1,
            "Registered sync job"
        );

        inner.busy_resources.insert(job.resource_id);
        inner.jobs.insert(job.job_id.clone(), job);
        Ok(())
    }

    /// Remove a job on any terminal transition; idempotent, removing an
    /// unknown id is a no-op
    pub async fn remove(&self, job_id: &JobId) -> Option<ActiveJob> {
        let mut inner = self.inner.lock().await;
        let removed = inner.jobs.remove(job_id);
        match &removed {
            Some(job) => {
                inner.busy_resources.remove(&job.resource_id);
                debug!(
                    %job_id,
                    resource_id = %job.resource_id,
                    active = inner.jobs.len(),
                    "Removed sync job from registry"
                );
            }
            None => {
                debug!(%job_id, "Remove for unknown job id, ignoring");
            }
        }
        removed
    }

    /// Record the latest remote-reported state on an active job so
    /// `active_jobs` snapshots reflect it. Returns false for unknown ids.
    pub async fn update_status(&self, job_id: &JobId, status: super::types::JobStatus) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.jobs.get_mut(job_id) {
            Some(job) => {
                job.status = status;
                true
            }
            None => false,
        }
    }

    /// Cancel one job: invalidate its token and remove it immediately.
    /// Returns false if the id is not active.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.jobs.remove(job_id) {
            Some(job) => {
                inner.busy_resources.remove(&job.resource_id);
                job.token.cancel();
                info!(%job_id, resource_id = %job.resource_id, "Cancelled sync job");
                true
            }
            None => {
                warn!(%job_id, "Cancel requested for unknown job id");
                false
            }
        }
    }

    /// Invalidate every active job's token and clear the registry.
    /// Coarse-grained shutdown/reset; returns the number of jobs cancelled.
    pub async fn cancel_all(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let count = inner.jobs.len();
        for job in inner.jobs.values() {
            job.token.cancel();
        }
        inner.jobs.clear();
        inner.busy_resources.clear();
        if count > 0 {
            info!(cancelled = count, "Cancelled all active sync jobs");
        }
        count
    }

    pub async fn is_resource_busy(&self, resource_id: Uuid) -> bool {
        self.inner.lock().await.busy_resources.contains(&resource_id)
    }

    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn contains(&self, job_id: &JobId) -> bool {
        self.inner.lock().await.jobs.contains_key(job_id)
    }

    /// Snapshot of all active jobs for introspection
    pub async fn active_jobs(&self) -> Vec<ActiveJobInfo> {
        let inner = self.inner.lock().await;
        inner.jobs.values().map(ActiveJobInfo::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_jobs::types::{JobStatus, SyncOptions};
    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    fn job(id: &str, resource_id: Uuid) -> ActiveJob {
        ActiveJob {
            job_id: JobId::from(id),
            resource_id,
            status: JobStatus::Running,
            retry_count: 0,
            token: CancellationToken::new(),
            started_at: Utc::now(),
            options: SyncOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_per_resource_exclusivity() {
        let registry = JobRegistry::new(3);
        let resource_id = Uuid::new_v4();

        registry.try_insert(job("job-1", resource_id)).await.unwrap();
        assert!(registry.is_resource_busy(resource_id).await);

        let err = registry
            .try_insert(job("job-2", resource_id))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ResourceBusy { resource_id: r } if r == resource_id));
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        let registry = JobRegistry::new(2);

        registry.try_insert(job("job-1", Uuid::new_v4())).await.unwrap();
        registry.try_insert(job("job-2", Uuid::new_v4())).await.unwrap();

        let err = registry
            .try_insert(job("job-3", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::TooManyJobs { limit: 2 }));
        assert_eq!(registry.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_remove_frees_resource_and_slot() {
        let registry = JobRegistry::new(1);
        let resource_id = Uuid::new_v4();

        registry.try_insert(job("job-1", resource_id)).await.unwrap();
        assert!(!registry.can_start(resource_id).await);

        let removed = registry.remove(&JobId::from("job-1")).await;
        assert_eq!(removed.unwrap().resource_id, resource_id);
        assert!(!registry.is_resource_busy(resource_id).await);
        assert!(registry.can_start(resource_id).await);
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = JobRegistry::new(3);
        assert!(registry.remove(&JobId::from("ghost")).await.is_none());

        registry.try_insert(job("job-1", Uuid::new_v4())).await.unwrap();
        assert!(registry.remove(&JobId::from("job-1")).await.is_some());
        assert!(registry.remove(&JobId::from("job-1")).await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_invalidates_token_and_removes() {
        let registry = JobRegistry::new(3);
        let entry = job("job-1", Uuid::new_v4());
        let token = entry.token.clone();

        registry.try_insert(entry).await.unwrap();
        assert!(registry.cancel(&JobId::from("job-1")).await);
        assert!(token.is_cancelled());
        assert_eq!(registry.active_count().await, 0);

        // Cancelling again is a no-op
        assert!(!registry.cancel(&JobId::from("job-1")).await);
    }

    #[tokio::test]
    async fn test_cancel_all_clears_everything() {
        let registry = JobRegistry::new(3);
        let first = job("job-1", Uuid::new_v4());
        let second = job("job-2", Uuid::new_v4());
        let tokens = [first.token.clone(), second.token.clone()];

        registry.try_insert(first).await.unwrap();
        registry.try_insert(second).await.unwrap();

        assert_eq!(registry.cancel_all().await, 2);
        assert!(tokens.iter().all(|t| t.is_cancelled()));
        assert_eq!(registry.active_count().await, 0);
        assert!(registry.active_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_tracks_remote_state() {
        let registry = JobRegistry::new(3);
        let mut entry = job("job-1", Uuid::new_v4());
        entry.status = JobStatus::Pending;
        registry.try_insert(entry).await.unwrap();

        assert!(
            registry
                .update_status(&JobId::from("job-1"), JobStatus::Running)
                .await
        );
        assert_eq!(registry.active_jobs().await[0].status, JobStatus::Running);

        // Unknown ids are reported, not silently created
        assert!(
            !registry
                .update_status(&JobId::from("ghost"), JobStatus::Running)
                .await
        );
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_active_jobs_snapshot() {
        let registry = JobRegistry::new(3);
        let resource_id = Uuid::new_v4();
        registry.try_insert(job("job-1", resource_id)).await.unwrap();

        let jobs = registry.active_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, JobId::from("job-1"));
        assert_eq!(jobs[0].resource_id, resource_id);
        assert_eq!(jobs[0].status, JobStatus::Running);
    }
}
