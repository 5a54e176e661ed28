use rand::Rng;
use std::time::Duration;

/// Invalid retry parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("base_delay must be greater than zero")]
    ZeroBaseDelay,
    #[error("max_delay ({max:?}) must be at least base_delay ({base:?})")]
    MaxBelowBase { base: Duration, max: Duration },
    #[error("backoff_factor must be a finite number >= 1, got {0}")]
    InvalidBackoffFactor(f64),
}

/// Exponential backoff parameters with caps.
///
/// Validated on construction and immutable afterwards, so one config can be
/// shared by every call that uses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
        jitter: bool,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if base_delay.is_zero() {
            return Err(ConfigError::ZeroBaseDelay);
        }
        if max_delay < base_delay {
            return Err(ConfigError::MaxBelowBase {
                base: base_delay,
                max: max_delay,
            });
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(backoff_factor));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff_factor,
            jitter,
        })
    }

    /// Maximum number of attempts (including the first).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Upper bound on any single backoff delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Same parameters with jitter switched on or off.
    pub fn with_jitter(self, jitter: bool) -> Self {
        Self { jitter, ..self }
    }

    pub fn scheduler(&self) -> BackoffScheduler {
        BackoffScheduler::new(self)
    }
}

/// Computes the wait before retry `attempt_index + 1`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffScheduler {
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    jitter: bool,
    max_attempts: u32,
}

impl BackoffScheduler {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            base_delay: config.base_delay,
            max_delay: config.max_delay,
            backoff_factor: config.backoff_factor,
            jitter: config.jitter,
            max_attempts: config.max_attempts,
        }
    }

    /// `min(base * factor^attempt_index, max_delay)`, before jitter.
    pub fn nominal_delay(&self, attempt_index: u32) -> Duration {
        let exp = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let raw = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        // Also catches raw == inf for very large attempt indices.
        if raw >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(raw)
    }

    /// Delay to sleep after the failed attempt `attempt_index` (0-based).
    ///
    /// With jitter on, the capped delay is scaled by a uniform factor in
    /// `[0.5, 1.0)` drawn from `rng`, so concurrent callers don't retry in
    /// lockstep. Pass a seeded rng for a reproducible schedule.
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt_index: u32, rng: &mut R) -> Duration {
        let delay = self.nominal_delay(attempt_index);
        if !self.jitter {
            return delay;
        }
        let scale: f64 = rng.random_range(0.5..1.0);
        delay.mul_f64(scale)
    }

    /// Number of retries (sleeps) in a run that exhausts every attempt.
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// Un-jittered delays slept by a run that exhausts every attempt.
    ///
    /// Retries are listed one by one while the delay still grows. Once it
    /// settles (at `max_delay`, or from the start when the factor is 1), the
    /// rest are folded into a single step. Past [`MAX_LISTED_RETRIES`] the
    /// tail is folded as well, so the result stays small for any budget.
    pub fn nominal_schedule(&self) -> Vec<ScheduleStep> {
        let retries = self.retries();
        let mut steps = Vec::new();
        let mut retry = 1;
        while retry <= retries {
            let delay = self.nominal_delay(retry - 1);
            let settled = delay >= self.max_delay || self.backoff_factor <= 1.0;
            if settled || retry > MAX_LISTED_RETRIES {
                steps.push(ScheduleStep {
                    first_retry: retry,
                    last_retry: retries,
                    delay: self.nominal_delay(retries - 1),
                });
                break;
            }
            steps.push(ScheduleStep {
                first_retry: retry,
                last_retry: retry,
                delay,
            });
            retry += 1;
        }
        steps
    }
}

/// Retries listed individually by [`BackoffScheduler::nominal_schedule`].
pub const MAX_LISTED_RETRIES: u32 = 64;

/// A run of retries in a nominal schedule (1-based, inclusive).
///
/// `delay` is the wait before `last_retry`; delays within the run never
/// decrease and never exceed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleStep {
    pub first_retry: u32,
    pub last_retry: u32,
    pub delay: Duration,
}

impl ScheduleStep {
    pub fn retry_count(&self) -> u32 {
        self.last_retry - self.first_retry + 1
    }

    pub fn is_single(&self) -> bool {
        self.first_retry == self.last_retry
    }
}
