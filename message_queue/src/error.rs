//! Error types for queue operations
//!
//! Every recoverable condition is reported through a return value at the
//! call site. Pushing a payload of the wrong type into a typed queue is not
//! one of them: that is a programming error and panics.

use std::fmt;
use thiserror::Error;

/// Reason a push was refused
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The queue already holds `max_capacity` messages
    #[error("queue is full")]
    Full,

    /// The queue has been cancelled and accepts no more messages
    #[error("queue is cancelled")]
    Cancelled,
}

/// Reason a pop produced nothing
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Non-blocking pop found the queue empty
    #[error("queue is empty")]
    Empty,

    /// The queue was cancelled; callers must stop popping
    #[error("queue is cancelled")]
    Cancelled,
}

/// A push that was refused, handing the value back to the caller
///
/// The queue never retries on its own. The producer decides whether to
/// retry, drop, or apply backpressure upstream.
pub struct Rejected<T> {
    /// Why the queue refused the value
    pub reason: PushError,
    /// The value that was not enqueued
    pub value: T,
}

impl<T> Rejected<T> {
    pub(crate) fn new(reason: PushError, value: T) -> Self {
        Self { reason, value }
    }

    /// Returns the rejected value
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Checks if the push failed because the queue was at capacity
    pub fn is_full(&self) -> bool {
        self.reason == PushError::Full
    }

    /// Checks if the push failed because the queue was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.reason == PushError::Cancelled
    }

    /// Maps the carried value, keeping the reason
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rejected<U> {
        Rejected {
            reason: self.reason,
            value: f(self.value),
        }
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push rejected: {}", self.reason)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration was not valid JSON for the expected schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration parsed but holds an unusable value
    #[error("invalid config: {0}")]
    Invalid(String),
}
