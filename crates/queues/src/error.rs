//! Queue error types

use std::fmt;
use thiserror::Error;

/// Errors creating or resolving queues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// No queue registered under this alias
    #[error("queue '{name}' not found")]
    NotFound { name: String },

    /// Queue exists but carries a different element type
    #[error("queue '{name}' carries {actual}, requested {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Alias already taken
    #[error("queue '{name}' is already registered")]
    Duplicate { name: String },

    /// Capacity must be at least one
    #[error("queue '{name}' must have a capacity greater than zero")]
    ZeroCapacity { name: String },
}

impl QueueError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

/// A push that did not complete in time
///
/// The value was not enqueued and is handed back to the caller, who
/// decides whether to retry or drop it.
pub struct PushTimeout<T>(pub T);

impl<T> PushTimeout<T> {
    /// Recover the value that was not enqueued
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushTimeout(..)")
    }
}

impl<T> fmt::Display for PushTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out pushing onto a full queue")
    }
}

impl<T> std::error::Error for PushTimeout<T> {}
