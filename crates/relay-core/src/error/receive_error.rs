//! Receiver and dispatch errors.
//!
//! The registry itself never fails. The only failure surface is a receiver,
//! which can return a [`ReceiveError`] or panic; both end up as a
//! [`ReceiverFailure`] in the dispatch report.

use crate::receiver::ReceiverId;
use std::fmt;

/// Failure to convert a raw payload into typed data
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to decode JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported payload: {0}")]
    Unsupported(String),
}

/// Error returned by a receiver while handling an event
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Receiver rejected event: {0}")]
    Rejected(String),

    #[error("Receiver failed: {0}")]
    Other(#[source] anyhow::Error),
}

impl ReceiveError {
    /// Create a rejection error
    #[must_use]
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self::Rejected(reason.to_string())
    }

    /// Wrap any error
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        Self::Other(err.into())
    }

    /// Check if the payload could not be decoded
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Result type for receiver operations
pub type ReceiveResult<T> = Result<T, ReceiveError>;

/// Why a receiver failed during dispatch
#[derive(Debug, thiserror::Error)]
pub enum FailureReason {
    #[error("{0}")]
    Error(#[source] ReceiveError),

    #[error("Receiver panicked: {0}")]
    Panicked(String),
}

impl FailureReason {
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

/// One receiver that failed while handling an event
#[derive(Debug)]
pub struct ReceiverFailure {
    /// Identity of the failed receiver
    pub receiver: ReceiverId,
    /// Receiver name at the time of the failure
    pub name: String,
    /// What went wrong
    pub reason: FailureReason,
}

impl ReceiverFailure {
    #[must_use]
    pub fn new(receiver: ReceiverId, name: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            receiver,
            name: name.into(),
            reason,
        }
    }
}

impl fmt::Display for ReceiverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.receiver, self.reason)
    }
}

/// Aggregated receiver failures of a single dispatch
#[derive(Debug, thiserror::Error)]
#[error("{} of {notified} receiver(s) failed", .failures.len())]
pub struct DispatchError {
    /// Number of receivers invoked
    pub notified: usize,
    /// Receivers that failed
    pub failures: Vec<ReceiverFailure>,
}
