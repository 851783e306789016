//! Outcome of streaming data through a source or sink

use serde::{Deserialize, Serialize};

/// Result of a streaming operation
pub type StreamResult<T> = std::result::Result<T, StreamFailure>;

/// Coarse classification of a stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    GeneralError,
    NotFound,
    NotAuthorized,
}

/// A failed stream operation with one or more messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFailure {
    pub reason: FailureReason,
    pub messages: Vec<String>,
}

impl StreamFailure {
    pub fn new(reason: FailureReason, messages: Vec<String>) -> Self {
        Self { reason, messages }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(FailureReason::GeneralError, vec![msg.into()])
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(FailureReason::NotFound, vec![msg.into()])
    }

    pub fn not_authorized(msg: impl Into<String>) -> Self {
        Self::new(FailureReason::NotAuthorized, vec![msg.into()])
    }

    /// All messages joined into a single line
    pub fn failure_detail(&self) -> String {
        self.messages.join(", ")
    }
}

impl std::fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.reason, self.failure_detail())
    }
}

impl std::error::Error for StreamFailure {}
