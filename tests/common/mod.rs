//! Shared test transport with scriptable responses
//!
//! Submission responses are consumed from a script queue (falling back to
//! acceptance with a generated job id); status responses come from a script
//! queue first, then from a per-resource completion flag so multi-job tests
//! can finish jobs individually.

#![allow(dead_code)]

use async_trait::async_trait;
use board_sync::{JobId, JobStatus, JobTransport, RemoteJobSnapshot, SyncOptions, TransportError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
pub struct ScriptedTransport {
    submit_script: Mutex<VecDeque<Result<JobId, TransportError>>>,
    status_script: Mutex<VecDeque<Result<RemoteJobSnapshot, TransportError>>>,
    completed_resources: Mutex<HashSet<Uuid>>,
    job_resources: Mutex<HashMap<JobId, Uuid>>,
    submit_times: Mutex<Vec<tokio::time::Instant>>,
    submit_count: AtomicUsize,
    status_count: AtomicUsize,
    next_job_number: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit(&self, response: Result<JobId, TransportError>) {
        self.submit_script.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, response: Result<RemoteJobSnapshot, TransportError>) {
        self.status_script.lock().unwrap().push_back(response);
    }

    /// After this, status queries for the resource's job report `complete`
    pub fn mark_complete(&self, resource_id: Uuid) {
        self.completed_resources.lock().unwrap().insert(resource_id);
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_count.load(Ordering::SeqCst)
    }

    /// Timestamps of every submission attempt, in order
    pub fn submit_times(&self) -> Vec<tokio::time::Instant> {
        self.submit_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobTransport for ScriptedTransport {
    async fn submit(
        &self,
        resource_id: Uuid,
        _options: &SyncOptions,
        _token: &CancellationToken,
    ) -> Result<JobId, TransportError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.submit_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());

        let scripted = self.submit_script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(response) => response,
            None => {
                let n = self.next_job_number.fetch_add(1, Ordering::SeqCst);
                Ok(JobId::from(format!("job-{n}").as_str()))
            }
        };

        if let Ok(job_id) = &result {
            self.job_resources
                .lock()
                .unwrap()
                .insert(job_id.clone(), resource_id);
        }
        result
    }

    async fn status(
        &self,
        job_id: &JobId,
        _token: &CancellationToken,
    ) -> Result<RemoteJobSnapshot, TransportError> {
        self.status_count.fetch_add(1, Ordering::SeqCst);

        if let Some(response) = self.status_script.lock().unwrap().pop_front() {
            return response;
        }

        let resource_id = self.job_resources.lock().unwrap().get(job_id).copied();
        let is_complete = resource_id
            .map(|r| self.completed_resources.lock().unwrap().contains(&r))
            .unwrap_or(false);

        if is_complete {
            Ok(complete_snapshot("Sync finished"))
        } else {
            Ok(running_snapshot("Sync in progress"))
        }
    }
}

pub fn pending_snapshot(message: &str) -> RemoteJobSnapshot {
    RemoteJobSnapshot {
        status: JobStatus::Pending,
        progress_message: Some(message.to_string()),
        logs: vec![],
    }
}

pub fn running_snapshot(message: &str) -> RemoteJobSnapshot {
    RemoteJobSnapshot {
        status: JobStatus::Running,
        progress_message: Some(message.to_string()),
        logs: vec![],
    }
}

pub fn complete_snapshot(message: &str) -> RemoteJobSnapshot {
    RemoteJobSnapshot {
        status: JobStatus::Complete,
        progress_message: Some(message.to_string()),
        logs: vec!["[DONE] sync finished".to_string()],
    }
}

pub fn failed_snapshot(message: &str) -> RemoteJobSnapshot {
    RemoteJobSnapshot {
        status: JobStatus::Failed,
        progress_message: Some(message.to_string()),
        logs: vec![],
    }
}

pub fn server_error(status: u16) -> TransportError {
    TransportError::Status {
        status,
        message: "server error".to_string(),
    }
}
