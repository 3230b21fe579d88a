//! End-to-end lifecycle of a single sync job
//!
//! The submitter owns the `SUBMITTING` part of the state machine: fail-fast
//! registry checks, the retried submission request, registration, the
//! hand-off to the status poller, and the unconditional registry cleanup on
//! every terminal path.

use super::poller::{ProgressSink, StatusPoller};
use super::registry::JobRegistry;
use super::retry::RetryPolicy;
use super::types::{ActiveJob, JobId, JobStatus, SyncOptions, SyncOutcome};
use crate::errors::{SyncError, TransportError};
use crate::transport::JobTransport;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(crate) struct JobSubmitter {
    registry: Arc<JobRegistry>,
    transport: Arc<dyn JobTransport>,
    retry_policy: RetryPolicy,
    poller: StatusPoller,
}

impl JobSubmitter {
    pub(crate) fn new(
        registry: Arc<JobRegistry>,
        transport: Arc<dyn JobTransport>,
        retry_policy: RetryPolicy,
        poller: StatusPoller,
    ) -> Self {
        Self {
            registry,
            transport,
            retry_policy,
            poller,
        }
    }

    /// Drive one job from request to terminal outcome
    pub(crate) async fn run(
        &self,
        resource_id: Uuid,
        options: SyncOptions,
        token: CancellationToken,
        sink: ProgressSink,
    ) -> Result<SyncOutcome, SyncError> {
        // Fail fast before any network call
        self.registry.check_can_start(resource_id).await?;

        let (job_id, retry_count) = self
            .submit_with_retry(resource_id, &options, &token)
            .await?;

        // Registered as pending; the poller advances the status once the
        // remote reports it running
        let job = ActiveJob {
            job_id: job_id.clone(),
            resource_id,
            status: JobStatus::Pending,
            retry_count,
            token: token.clone(),
            started_at: Utc::now(),
            options,
        };

        if let Err(err) = self.registry.try_insert(job).await {
            // A concurrent submitter won the race after our submission was
            // accepted. The remote job keeps running untracked: the job API
            // exposes no cancel endpoint, so this is a known gap. Callers
            // always see this as a busy resource regardless of which
            // invariant the rival tripped.
            warn!(
                %job_id,
                %resource_id,
                error = %err,
                "Submission accepted but registry slot was taken; remote job is untracked"
            );
            return Err(SyncError::ResourceBusy { resource_id });
        }

        let outcome = self
            .poller
            .run(&job_id, resource_id, &token, &sink)
            .await;

        // Cleanup must happen on every terminal path so a finished job never
        // occupies a concurrency slot or blocks its resource
        self.registry.remove(&job_id).await;

        match &outcome {
            Ok(result) => {
                info!(%job_id, %resource_id, outcome = %result.message, "Sync job completed");
            }
            Err(err) if err.is_cancelled() => {
                info!(%job_id, %resource_id, "Sync job cancelled");
            }
            Err(err) => {
                error!(%job_id, %resource_id, error = %err, "Sync job failed");
            }
        }

        outcome
    }

    /// Submission under the retry policy, as an explicit bounded loop with a
    /// zero-based attempt counter. Returns the accepted job id and how many
    /// retries it took.
    async fn submit_with_retry(
        &self,
        resource_id: Uuid,
        options: &SyncOptions,
        token: &CancellationToken,
    ) -> Result<(JobId, u32), SyncError> {
        let mut attempt = 0u32;

        loop {
            if token.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let result = tokio::select! {
                _ = token.cancelled() => return Err(SyncError::Cancelled),
                result = self.transport.submit(resource_id, options, token) => result,
            };

            match result {
                Ok(job_id) => {
                    if attempt > 0 {
                        debug!(%resource_id, %job_id, retries = attempt, "Submission succeeded after retries");
                    }
                    return Ok((job_id, attempt));
                }
                Err(TransportError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err)
                    if attempt < self.retry_policy.max_retries()
                        && self.retry_policy.is_retryable(&err) =>
                {
                    let delay = self.retry_policy.backoff_delay(attempt);
                    warn!(
                        %resource_id,
                        attempt = attempt + 1,
                        max_retries = self.retry_policy.max_retries(),
                        delay = ?delay,
                        error = %err,
                        "Submission failed, retrying"
                    );
                    attempt += 1;

                    tokio::select! {
                        _ = token.cancelled() => return Err(SyncError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) => {
                    return Err(SyncError::SubmissionFailed {
                        attempts: attempt + 1,
                        source: err,
                    });
                }
            }
        }
    }
}
