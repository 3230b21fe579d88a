//! HTTP transport to the remote job API
//!
//! `JobTransport` is the seam the orchestrator drives; `HttpJobTransport` is
//! the reqwest-backed production implementation. Both calls carry the job's
//! cancellation token so an invalidated token aborts the request promptly
//! instead of waiting out a full round trip.

use crate::config::SyncConfig;
use crate::errors::TransportError;
use crate::sync_jobs::{JobId, RemoteJobSnapshot, SyncOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Remote job API operations used by the orchestrator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// `POST /sync-jobs`: submit a sync request for a resource, returning
    /// the remote job id on acceptance
    async fn submit(
        &self,
        resource_id: Uuid,
        options: &SyncOptions,
        token: &CancellationToken,
    ) -> Result<JobId, TransportError>;

    /// `GET /sync-jobs/{job_id}`: fetch the current remote job state
    async fn status(
        &self,
        job_id: &JobId,
        token: &CancellationToken,
    ) -> Result<RemoteJobSnapshot, TransportError>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    resource_id: Uuid,
    #[serde(flatten)]
    options: &'a SyncOptions,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: JobId,
}

/// reqwest-backed transport with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpJobTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpJobTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        // A trailing slash keeps Url::join from swallowing the last path segment
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &SyncConfig) -> anyhow::Result<Self> {
        Self::new(&config.base_url, config.request_timeout)
    }

    fn submit_url(&self) -> Result<Url, TransportError> {
        self.base_url
            .join("sync-jobs")
            .map_err(|e| TransportError::Connect(e.to_string()))
    }

    fn status_url(&self, job_id: &JobId) -> Result<Url, TransportError> {
        self.base_url
            .join(&format!("sync-jobs/{job_id}"))
            .map_err(|e| TransportError::Connect(e.to_string()))
    }
}

fn map_request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(err.to_string())
    }
}

/// Turn a non-success response into `TransportError::Status`, keeping the
/// body text as the message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl JobTransport for HttpJobTransport {
    async fn submit(
        &self,
        resource_id: Uuid,
        options: &SyncOptions,
        token: &CancellationToken,
    ) -> Result<JobId, TransportError> {
        if token.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let url = self.submit_url()?;
        let body = SubmitRequest {
            resource_id,
            options,
        };

        debug!(%resource_id, %url, "Submitting sync job");

        let response = tokio::select! {
            _ = token.cancelled() => return Err(TransportError::Cancelled),
            result = self.client.post(url).json(&body).send() => {
                result.map_err(map_request_error)?
            }
        };

        let response = check_status(response).await?;
        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        debug!(%resource_id, job_id = %parsed.job_id, "Sync job accepted");
        Ok(parsed.job_id)
    }

    async fn status(
        &self,
        job_id: &JobId,
        token: &CancellationToken,
    ) -> Result<RemoteJobSnapshot, TransportError> {
        if token.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let url = self.status_url(job_id)?;

        let response = tokio::select! {
            _ = token.cancelled() => return Err(TransportError::Cancelled),
            result = self.client.get(url).send() => {
                result.map_err(map_request_error)?
            }
        };

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}
