//! Storage error taxonomy.
//!
//! Failure kinds are tagged so callers handle them exhaustively instead of
//! string-matching: transport-class failures trigger local fallback inside
//! the coordinator, while quota exhaustion bubbles up as a recoverable,
//! user-actionable condition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No remote backend credentials are present. Distinct from a transport
    /// failure: it selects local-only mode rather than triggering fallback.
    #[error("remote backend is not configured")]
    Unconfigured,

    /// The remote store was unreachable or answered outside 2xx. Includes
    /// request timeouts.
    #[error("remote request failed: {0}")]
    Transport(String),

    /// The remote store rejected the credentials for this operation.
    #[error("remote permission denied: {0}")]
    PermissionDenied(String),

    /// The local cache refused a write for size. Carries what the write
    /// needed and what the quota allows so the message can be actionable:
    /// free space by deleting entries or avoiding large media.
    #[error("local storage quota exceeded: needed {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },

    #[error("failed to encode or decode entries: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Transport-class failures are recovered by falling back to the local
    /// cache; everything else is surfaced.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Unconfigured | StoreError::Transport(_) | StoreError::PermissionDenied(_)
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN =>
            {
                StoreError::PermissionDenied(err.to_string())
            }
            _ => StoreError::Transport(err.to_string()),
        }
    }
}
