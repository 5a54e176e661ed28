//! Retry and backoff policy.
//!
//! This module encapsulates error classification (retryable codes and message
//! phrases), exponential backoff with jitter, and the blocking retry loop, so
//! that every API call site shares one consistent policy.

mod classify;
mod error;
mod failure;
mod policy;
mod run;
mod sleep;

pub use classify::{
    ClassifiedError, ErrorClassifier, MatchedRule, DEFAULT_RETRYABLE_CODES,
    DEFAULT_RETRYABLE_PHRASES,
};
pub use error::{ApiError, ApiFailure};
pub use failure::{FailureReason, RetryFailure};
pub use policy::{BackoffScheduler, ConfigError, RetryConfig, ScheduleStep, MAX_LISTED_RETRIES};
pub use run::{Attempt, AttemptOutcome, RetryExecutor, RetryRun};
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};
