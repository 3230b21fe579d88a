//! Orchestrator configuration
//!
//! `SyncConfig` is supplied by the embedding application. Every field has a
//! default, so `SyncConfig::default()` and a fully empty config file both
//! yield a working setup. Durations accept human-readable strings ("2s",
//! "500ms") as well as bare seconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod duration_serde;

/// Configuration for the sync job orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote job API, e.g. `http://localhost:8000/api/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Global cap on simultaneously active sync jobs
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Maximum number of submission retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential submission backoff
    #[serde(default = "default_retry_base_delay", with = "duration_serde::duration")]
    pub retry_base_delay: Duration,

    /// Interval between status polls
    #[serde(default = "default_poll_interval", with = "duration_serde::duration")]
    pub poll_interval: Duration,

    /// Consecutive polling errors tolerated before giving up on a job
    #[serde(default = "default_max_consecutive_poll_errors")]
    pub max_consecutive_poll_errors: u32,

    /// Per-request timeout for submission and status queries
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_max_consecutive_poll_errors() -> u32 {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            poll_interval: default_poll_interval(),
            max_consecutive_poll_errors: default_max_consecutive_poll_errors(),
            request_timeout: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(2));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_consecutive_poll_errors, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_config_deserializes_to_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config_with_human_readable_durations() {
        let config: SyncConfig = serde_json::from_str(
            r#"{
                "base_url": "https://erp.example.com/api/v1",
                "poll_interval": "500ms",
                "request_timeout": "10s",
                "max_concurrent_jobs": 5
            }"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://erp.example.com/api/v1");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_concurrent_jobs, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.max_retries, 3);
    }
}
