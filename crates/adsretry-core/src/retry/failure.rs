//! Normalized failure returned when the retry policy gives up.

use std::fmt;

use super::error::ApiFailure;

/// Why the executor stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The error did not match any retryable code or phrase.
    NonRetryable,
    /// Every attempt failed with a retryable error and the budget ran out.
    Exhausted,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NonRetryable => "non_retryable",
            FailureReason::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced to callers once retrying stops.
///
/// The last API error is kept as the `source()` so `{:#}` formatting with
/// anyhow prints the whole chain.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RetryFailure<E> {
    message: String,
    operation: String,
    reason: FailureReason,
    attempt_count: u32,
    max_attempts: u32,
    #[source]
    source: E,
}

impl<E: ApiFailure> RetryFailure<E> {
    pub(crate) fn non_retryable(
        operation: &str,
        source: E,
        attempt_count: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            message: format!("API error in {}", operation),
            operation: operation.to_string(),
            reason: FailureReason::NonRetryable,
            attempt_count,
            max_attempts,
            source,
        }
    }

    pub(crate) fn exhausted(operation: &str, source: E, max_attempts: u32) -> Self {
        Self {
            message: format!("max retries exceeded for {}", operation),
            operation: operation.to_string(),
            reason: FailureReason::Exhausted,
            attempt_count: max_attempts,
            max_attempts,
            source,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the wrapped operation, as passed to the executor.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }

    /// Number of times the operation was invoked before giving up.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The last API error observed.
    pub fn original_error(&self) -> &E {
        &self.source
    }

    pub fn into_original_error(self) -> E {
        self.source
    }
}
