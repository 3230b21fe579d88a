//! Error types for the sync job orchestrator

pub mod types;

pub use types::{SyncError, TransportError};
