//! Error taxonomy shared by the clients and the poller.

use serde::Serialize;
use thiserror::Error;

/// Outcome of a single failed fetch against a remote endpoint.
///
/// `Cancelled` is not a failure: callers discard it without touching any
/// state and without reporting it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("invalid subject identifier: {0:?}")]
    InvalidSubject(String),

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Short machine-readable label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Malformed(_) => "malformed",
            FetchError::Rejected(_) => "rejected",
            FetchError::InvalidSubject(_) => "invalid_subject",
            FetchError::Cancelled => "cancelled",
        }
    }
}

/// Failure of one poller refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fan-out over several subjects where none of them resolved.
    #[error("no subject resolved ({attempted} attempted)")]
    NoneResolved { attempted: usize },
}

impl RefreshError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RefreshError::Fetch(e) if e.is_cancelled())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RefreshError::Fetch(e) => e.kind(),
            RefreshError::NoneResolved { .. } => "none_resolved",
        }
    }
}
