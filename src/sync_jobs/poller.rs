//! Fixed-interval status polling for an accepted job
//!
//! The poller owns the `POLLING -> {COMPLETE | FAILED | CANCELLED}` part of
//! the job state machine. Its error handling is a tolerance rule, not a
//! retry policy: polling errors are transport flakiness on an already
//! accepted job, so the loop keeps going until `max_consecutive_errors`
//! failures land in a row, and one success resets the counter.

use super::registry::JobRegistry;
use super::types::{JobId, JobStatus, ProgressCallback, ProgressEvent, SyncOutcome};
use crate::config::SyncConfig;
use crate::errors::{SyncError, TransportError};
use crate::transport::JobTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fan-out point for progress events: the service-wide broadcast channel
/// plus an optional per-call callback
pub(crate) struct ProgressSink {
    events: broadcast::Sender<ProgressEvent>,
    callback: Option<ProgressCallback>,
}

impl ProgressSink {
    pub(crate) fn new(
        events: broadcast::Sender<ProgressEvent>,
        callback: Option<ProgressCallback>,
    ) -> Self {
        Self { events, callback }
    }

    fn publish(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            callback(event.clone());
        }
        // Send fails only when nobody is subscribed, which is fine
        let _ = self.events.send(event);
    }
}

/// Polls a job's remote status until a terminal state, an unrecoverable
/// error run, or cancellation
pub struct StatusPoller {
    transport: Arc<dyn JobTransport>,
    registry: Arc<JobRegistry>,
    poll_interval: Duration,
    max_consecutive_errors: u32,
}

impl StatusPoller {
    pub fn new(
        transport: Arc<dyn JobTransport>,
        registry: Arc<JobRegistry>,
        poll_interval: Duration,
        max_consecutive_errors: u32,
    ) -> Self {
        Self {
            transport,
            registry,
            poll_interval,
            max_consecutive_errors,
        }
    }

    pub fn from_config(
        transport: Arc<dyn JobTransport>,
        registry: Arc<JobRegistry>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(
            transport,
            registry,
            config.poll_interval,
            config.max_consecutive_poll_errors,
        )
    }

    /// Run the polling loop to a terminal outcome. Cancellation is checked
    /// at the top of every iteration and raced against the in-flight query,
    /// so the loop stops within one poll interval of the token firing.
    pub(crate) async fn run(
        &self,
        job_id: &JobId,
        resource_id: Uuid,
        token: &CancellationToken,
        sink: &ProgressSink,
    ) -> Result<SyncOutcome, SyncError> {
        let mut consecutive_errors = 0u32;

        loop {
            if token.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let result = tokio::select! {
                _ = token.cancelled() => return Err(SyncError::Cancelled),
                result = self.transport.status(job_id, token) => result,
            };

            match result {
                Ok(snapshot) => {
                    consecutive_errors = 0;

                    // A query that raced a cancellation may still succeed;
                    // drop its event so nothing is delivered after cancel
                    if token.is_cancelled() {
                        return Err(SyncError::Cancelled);
                    }

                    sink.publish(ProgressEvent::from_snapshot(job_id, resource_id, &snapshot));

                    match snapshot.status {
                        JobStatus::Complete => {
                            return Ok(SyncOutcome {
                                job_id: job_id.clone(),
                                message: snapshot
                                    .progress_message
                                    .unwrap_or_else(|| "Sync completed successfully".to_string()),
                                logs: snapshot.logs,
                            });
                        }
                        JobStatus::Failed => {
                            return Err(SyncError::RemoteJobFailed {
                                message: snapshot
                                    .progress_message
                                    .unwrap_or_else(|| "Sync failed".to_string()),
                            });
                        }
                        JobStatus::Pending | JobStatus::Running => {
                            // Keep the registry snapshot in step with the
                            // remote-reported state
                            self.registry.update_status(job_id, snapshot.status).await;
                            debug!(%job_id, status = ?snapshot.status, "Sync job still in progress");
                        }
                        JobStatus::Cancelled => {
                            // Local-only state; a remote snapshot never carries it,
                            // but treat it as cancellation if one ever does
                            return Err(SyncError::Cancelled);
                        }
                    }
                }
                Err(TransportError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err) => {
                    consecutive_errors += 1;
                    warn!(
                        %job_id,
                        consecutive_errors,
                        max = self.max_consecutive_errors,
                        error = %err,
                        "Status poll failed"
                    );
                    if consecutive_errors >= self.max_consecutive_errors {
                        return Err(SyncError::PollingExhausted {
                            attempts: consecutive_errors,
                            source: err,
                        });
                    }
                }
            }

            tokio::select! {
                _ = token.cancelled() => return Err(SyncError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
