//! Scripted stand-in for a remote API call.
//!
//! Plays back a fixed list of outcomes, one per invocation; the last entry
//! repeats once the script runs out, so `[fail]` means "always fail".

use adsretry_core::retry::ApiError;
use std::cell::Cell;

#[derive(Debug, Clone)]
pub enum Step {
    Api(ApiError),
    Unexpected(&'static str),
    Succeed(u32),
}

pub struct ScriptedCall {
    steps: Vec<Step>,
    calls: Cell<u32>,
}

impl ScriptedCall {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        Self {
            steps,
            calls: Cell::new(0),
        }
    }

    pub fn always(step: Step) -> Self {
        Self::new(vec![step])
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    /// One invocation of the fake API call.
    pub fn call(&self) -> anyhow::Result<u32> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        let idx = (n as usize).min(self.steps.len() - 1);
        match &self.steps[idx] {
            Step::Api(err) => Err(err.clone().into()),
            Step::Unexpected(msg) => {
                Err(std::io::Error::new(std::io::ErrorKind::Other, *msg).into())
            }
            Step::Succeed(v) => Ok(*v),
        }
    }
}

pub fn rate_exceeded() -> Step {
    Step::Api(ApiError::with_code("RATE_EXCEEDED", "Too many requests").request_id("req-1"))
}

pub fn auth_failure() -> Step {
    Step::Api(ApiError::with_code(
        "AUTHENTICATION_ERROR",
        "OAuth token has been revoked",
    ))
}
