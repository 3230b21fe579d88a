//! Caller-facing facade for the sync job orchestrator

use super::poller::{ProgressSink, StatusPoller};
use super::registry::JobRegistry;
use super::retry::RetryPolicy;
use super::submitter::JobSubmitter;
use super::types::{
    ActiveJobInfo, JobId, ProgressCallback, ProgressEvent, SyncOptions, SyncOutcome,
};
use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::transport::{HttpJobTransport, JobTransport};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Capacity of the progress broadcast channel; slow subscribers lag and
/// skip rather than buffer without bound
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// The only entry point consumers use to run sync jobs
///
/// `start` suspends the caller until the job reaches a terminal outcome
/// while other tasks keep making progress. Progress events for all jobs are
/// available via [`SyncJobService::subscribe`], or per job via
/// [`SyncJobService::start_with_callback`].
///
/// The service is cheap to clone; clones share the registry, transport and
/// event channel.
#[derive(Clone)]
pub struct SyncJobService {
    config: SyncConfig,
    registry: Arc<JobRegistry>,
    transport: Arc<dyn JobTransport>,
    events: broadcast::Sender<ProgressEvent>,
}

impl SyncJobService {
    /// Create a service over an arbitrary transport (tests use scripted ones)
    pub fn new(config: SyncConfig, transport: Arc<dyn JobTransport>) -> Self {
        let (events, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            registry: Arc::new(JobRegistry::new(config.max_concurrent_jobs)),
            transport,
            events,
            config,
        }
    }

    /// Create a service talking HTTP to `config.base_url`
    pub fn from_config(config: SyncConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpJobTransport::from_config(&config)?);
        Ok(Self::new(config, transport))
    }

    /// Start a sync job for `resource_id` and await its terminal outcome
    pub async fn start(
        &self,
        resource_id: Uuid,
        options: SyncOptions,
    ) -> Result<SyncOutcome, SyncError> {
        self.start_inner(resource_id, options, None).await
    }

    /// Like [`SyncJobService::start`], with a per-call observer invoked on
    /// every progress event for this job
    pub async fn start_with_callback(
        &self,
        resource_id: Uuid,
        options: SyncOptions,
        on_progress: ProgressCallback,
    ) -> Result<SyncOutcome, SyncError> {
        self.start_inner(resource_id, options, Some(on_progress))
            .await
    }

    async fn start_inner(
        &self,
        resource_id: Uuid,
        options: SyncOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<SyncOutcome, SyncError> {
        info!(%resource_id, "Starting sync job");

        let token = CancellationToken::new();
        let sink = ProgressSink::new(self.events.clone(), on_progress);
        let submitter = JobSubmitter::new(
            self.registry.clone(),
            self.transport.clone(),
            RetryPolicy::from_config(&self.config),
            StatusPoller::from_config(self.transport.clone(), self.registry.clone(), &self.config),
        );

        submitter.run(resource_id, options, token, sink).await
    }

    /// Subscribe to progress events for all jobs started through this service
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    /// Best-effort local cancellation: invalidates the job's token and frees
    /// its registry slot immediately. The poller observes the token within
    /// one poll interval; the remote job may keep running.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        self.registry.cancel(job_id).await
    }

    /// Cancel every active job; coarse-grained shutdown/reset
    pub async fn cancel_all(&self) -> usize {
        self.registry.cancel_all().await
    }

    pub async fn active_count(&self) -> usize {
        self.registry.active_count().await
    }

    pub async fn is_resource_busy(&self, resource_id: Uuid) -> bool {
        self.registry.is_resource_busy(resource_id).await
    }

    /// Snapshot of all currently active jobs
    pub async fn active_jobs(&self) -> Vec<ActiveJobInfo> {
        self.registry.active_jobs().await
    }
}
