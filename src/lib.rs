//! Client-side orchestrator for long-running remote board synchronization jobs
//!
//! A board sync runs on a remote server and can take minutes to finish. This
//! crate drives the client-side lifecycle of such jobs:
//! - submission with bounded exponential-backoff retries for transient errors
//! - a global concurrency cap and per-board exclusivity
//! - fixed-interval status polling with tolerance for flaky transports
//! - cooperative cancellation via `CancellationToken`
//! - progress events delivered as a broadcast stream or per-call callback
//!
//! The main entry point is [`SyncJobService`]; everything else supports it.
//! Jobs are not persisted: the registry lives for the process and nothing is
//! restored after a restart.

pub mod config;
pub mod errors;
pub mod sync_jobs;
pub mod transport;

pub use config::SyncConfig;
pub use errors::{SyncError, TransportError};
pub use sync_jobs::{
    ActiveJobInfo, JobId, JobStatus, ProgressCallback, ProgressEvent, RemoteJobSnapshot,
    SyncJobService, SyncOptions, SyncOutcome,
};
pub use transport::{HttpJobTransport, JobTransport};
