//! Submission retry policy
//!
//! Pure decision logic: classify a transport error as retryable or fatal and
//! compute the exponential backoff delay for a given attempt. This policy
//! governs only the submission request; the polling loop has its own,
//! separate error-tolerance rule (see `poller`).

use crate::config::SyncConfig;
use crate::errors::TransportError;
use std::time::Duration;

/// Decides whether a failed submission is retried and how long to wait
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    /// Maximum number of retries after the initial attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether the error is transient enough to justify resubmitting
    ///
    /// Retryable: transport timeouts and connection failures, HTTP 5xx
    /// except 501 (a permanent capability gap), and HTTP 429. Everything
    /// else is fatal, including cancellation.
    pub fn is_retryable(&self, error: &TransportError) -> bool {
        match error {
            TransportError::Timeout | TransportError::Connect(_) => true,
            TransportError::Status { status: 429, .. } => true,
            TransportError::Status { status, .. } => *status >= 500 && *status != 501,
            TransportError::Body(_) | TransportError::Cancelled => false,
        }
    }

    /// Delay before retry number `attempt` (zero-based): `base * 2^attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }
}
