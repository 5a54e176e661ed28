//! Blocking sleep used between attempts.

use std::sync::Mutex;
use std::time::Duration;

/// Blocks the calling thread for a backoff delay.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) {
        (**self).sleep(delay)
    }
}

/// Sleeps on the current thread with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Records requested delays without sleeping (dry runs, tests).
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(delay);
    }
}
