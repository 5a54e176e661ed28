//! Retry loop: run an operation until success or the policy says stop.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::classify::ErrorClassifier;
use super::error::ApiFailure;
use super::failure::RetryFailure;
use super::policy::{BackoffScheduler, RetryConfig};
use super::sleep::{Sleeper, ThreadSleeper};

/// What happened on a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// The operation failed with an API error.
    Failed { summary: String, retryable: bool },
    /// The operation failed with an error outside the API error domain.
    Unexpected { summary: String },
}

/// One invocation of the wrapped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 0-based attempt index.
    pub index: u32,
    /// Backoff slept before this attempt (zero for the first one).
    pub delay_before: Duration,
    pub outcome: AttemptOutcome,
}

/// Result of one execution together with its attempt history.
pub struct RetryRun<T> {
    pub result: Result<T>,
    pub attempts: Vec<Attempt>,
}

impl<T> RetryRun<T> {
    /// Number of times the operation was invoked.
    pub fn invocations(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// Sum of all backoff delays slept.
    pub fn total_delay(&self) -> Duration {
        self.attempts.iter().map(|a| a.delay_before).sum()
    }

    pub fn into_result(self) -> Result<T> {
        self.result
    }
}

/// Applies a retry policy around fallible API calls.
///
/// Holds only immutable policy data, so a single executor can be shared
/// across threads (given a `Sync` sleeper); each call keeps its own state.
#[derive(Debug, Clone)]
pub struct RetryExecutor<S = ThreadSleeper> {
    config: RetryConfig,
    classifier: ErrorClassifier,
    sleeper: S,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryExecutor {
    /// Executor with the default retryable codes and phrases.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_classifier(config, ErrorClassifier::default())
    }

    pub fn with_classifier(config: RetryConfig, classifier: ErrorClassifier) -> Self {
        Self {
            config,
            classifier,
            sleeper: ThreadSleeper,
        }
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    /// Replace the sleep primitive (e.g. to record delays instead of blocking).
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RetryExecutor<S2> {
        RetryExecutor {
            config: self.config,
            classifier: self.classifier,
            sleeper,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn scheduler(&self) -> BackoffScheduler {
        self.config.scheduler()
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Run `operation`, retrying transient `E` errors with backoff.
    ///
    /// Returns the operation's value, or an error that is either a
    /// [`RetryFailure<E>`] (non-retryable or exhausted) or, for errors that do
    /// not downcast to `E`, the operation's own error returned untouched.
    pub fn execute<E, T, F>(&self, operation: &str, f: F) -> Result<T>
    where
        E: ApiFailure,
        F: FnMut() -> Result<T>,
    {
        let mut rng = StdRng::from_os_rng();
        self.execute_with_rng::<E, T, F, _>(operation, &mut rng, f)
    }

    /// Like [`execute`](Self::execute) with a caller-supplied jitter source.
    pub fn execute_with_rng<E, T, F, R>(&self, operation: &str, rng: &mut R, f: F) -> Result<T>
    where
        E: ApiFailure,
        F: FnMut() -> Result<T>,
        R: Rng + ?Sized,
    {
        self.drive::<E, T, F, R>(operation, rng, f, None)
    }

    /// Wrap `f` so that every call goes through this policy.
    pub fn wrap<'a, E, T, F>(
        &'a self,
        operation: &'a str,
        mut f: F,
    ) -> impl FnMut() -> Result<T> + 'a
    where
        E: ApiFailure,
        T: 'a,
        F: FnMut() -> Result<T> + 'a,
    {
        move || self.execute::<E, T, _>(operation, &mut f)
    }

    /// The retry loop itself; also returns the attempt history.
    pub fn run<E, T, F, R>(&self, operation: &str, rng: &mut R, f: F) -> RetryRun<T>
    where
        E: ApiFailure,
        F: FnMut() -> Result<T>,
        R: Rng + ?Sized,
    {
        let mut attempts = Vec::new();
        let result = self.drive::<E, T, F, R>(operation, rng, f, Some(&mut attempts));
        RetryRun { result, attempts }
    }

    /// Shared loop. History is only built when the caller asked for it.
    fn drive<E, T, F, R>(
        &self,
        operation: &str,
        rng: &mut R,
        mut f: F,
        mut history: Option<&mut Vec<Attempt>>,
    ) -> Result<T>
    where
        E: ApiFailure,
        F: FnMut() -> Result<T>,
        R: Rng + ?Sized,
    {
        let max_attempts = self.config.max_attempts();
        let scheduler = self.config.scheduler();
        let mut delay_before = Duration::ZERO;
        let mut index = 0u32;

        loop {
            let attempt = index + 1;
            let err = match f() {
                Ok(value) => {
                    if index > 0 {
                        tracing::info!(operation, attempt, max_attempts, "succeeded after retry");
                    }
                    record(&mut history, index, delay_before, || AttemptOutcome::Success);
                    return Ok(value);
                }
                Err(err) => err,
            };

            // Only the declared API error type gets the retry policy; anything
            // else goes back to the caller as-is.
            let api_err = match err.downcast::<E>() {
                Ok(api_err) => api_err,
                Err(err) => {
                    tracing::error!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %err,
                        "unexpected error, not retrying"
                    );
                    record(&mut history, index, delay_before, || {
                        AttemptOutcome::Unexpected {
                            summary: err.to_string(),
                        }
                    });
                    return Err(err);
                }
            };

            let classified = self.classifier.inspect(&api_err);
            let retryable = classified.retryable;
            let code = classified.code.unwrap_or_else(|| "-".to_string());
            let summary = classified.message;

            if !retryable {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    code = %code,
                    error = %summary,
                    "non-retryable API error"
                );
                record(&mut history, index, delay_before, || {
                    AttemptOutcome::Failed { summary, retryable }
                });
                let failure =
                    RetryFailure::non_retryable(operation, api_err, attempt, max_attempts);
                return Err(anyhow::Error::new(failure));
            }

            if attempt >= max_attempts {
                tracing::error!(
                    operation,
                    attempt,
                    max_attempts,
                    code = %code,
                    error = %summary,
                    "all attempts failed"
                );
                record(&mut history, index, delay_before, || {
                    AttemptOutcome::Failed { summary, retryable }
                });
                let failure = RetryFailure::exhausted(operation, api_err, max_attempts);
                return Err(anyhow::Error::new(failure));
            }

            let delay = scheduler.delay_for(index, rng);
            tracing::warn!(
                operation,
                attempt,
                max_attempts,
                delay = ?delay,
                code = %code,
                error = %summary,
                "attempt failed, retrying"
            );
            record(&mut history, index, delay_before, || {
                AttemptOutcome::Failed { summary, retryable }
            });
            self.sleeper.sleep(delay);
            delay_before = delay;
            index += 1;
        }
    }
}

/// Append to `history` if one is being kept; `outcome` is only built then.
fn record(
    history: &mut Option<&mut Vec<Attempt>>,
    index: u32,
    delay_before: Duration,
    outcome: impl FnOnce() -> AttemptOutcome,
) {
    if let Some(history) = history.as_deref_mut() {
        history.push(Attempt {
            index,
            delay_before,
            outcome: outcome(),
        });
    }
}
