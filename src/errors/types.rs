//! Error type definitions for the sync job orchestrator
//!
//! Two layers: `TransportError` describes a single failed HTTP exchange with
//! the remote job API, `SyncError` is the terminal outcome surfaced to the
//! caller of `start`. Every `SyncError` variant maps to exactly one way a job
//! can end without completing.

use thiserror::Error;
use uuid::Uuid;

/// Failure of a single request against the remote job API
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The request exceeded the per-request timeout
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was dropped mid-flight
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success HTTP status
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    Body(String),

    /// The request was abandoned because its cancellation token fired
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Terminal outcome of a sync job that did not complete
#[derive(Error, Debug)]
pub enum SyncError {
    /// Another active job already owns this resource
    #[error("resource {resource_id} already has an active sync job")]
    ResourceBusy { resource_id: Uuid },

    /// The global concurrency cap is reached
    #[error("maximum of {limit} concurrent sync jobs reached")]
    TooManyJobs { limit: usize },

    /// Submission kept failing until the retry budget ran out,
    /// or failed once with a non-retryable error
    #[error("sync submission failed after {attempts} attempt(s): {source}")]
    SubmissionFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The remote system reported the job as failed; never retried
    #[error("remote sync job failed: {message}")]
    RemoteJobFailed { message: String },

    /// Too many consecutive transport errors while polling an accepted job
    #[error("status polling exhausted after {attempts} consecutive errors: {source}")]
    PollingExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The job was cancelled locally; distinct from failure so callers can
    /// avoid error-styling a user-initiated stop
    #[error("sync job cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether this outcome was a local cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}
