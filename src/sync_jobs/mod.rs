//! Sync job orchestration subsystem
//!
//! Drives long-running, server-executed synchronization jobs from a client
//! that stays responsive. The subsystem is built around five components:
//! - `RetryPolicy`: classifies submission errors and computes backoff
//! - `JobRegistry`: mutex-guarded table enforcing the concurrency cap and
//!   per-resource exclusivity
//! - `StatusPoller`: fixed-interval polling with bounded error tolerance
//! - `JobSubmitter`: one job's lifecycle from request to terminal outcome
//! - `SyncJobService`: the caller-facing facade

pub mod poller;
pub mod registry;
pub mod retry;
pub mod service;
pub mod submitter;
pub mod types;

pub use poller::StatusPoller;
pub use registry::JobRegistry;
pub use retry::RetryPolicy;
pub use service::SyncJobService;
pub use types::{
    ActiveJob, ActiveJobInfo, JobId, JobStatus, ProgressCallback, ProgressEvent,
    RemoteJobSnapshot, SyncOptions, SyncOutcome,
};
